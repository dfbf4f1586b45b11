use serde::{Deserialize, Serialize};

use crate::{
    catalogue::CatalogueError,
    render::render_map,
    routing::EdgeInfo,
    serialization::Snapshot,
};

pub const NOT_FOUND: &str = "not found";

/// One entry of `stat_requests`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum StatRequest {
    Stop { id: i64, name: String },
    Bus { id: i64, name: String },
    Map { id: i64 },
    Route { id: i64, from: String, to: String },
}

impl StatRequest {
    pub fn id(&self) -> i64 {
        match self {
            StatRequest::Stop { id, .. }
            | StatRequest::Bus { id, .. }
            | StatRequest::Map { id }
            | StatRequest::Route { id, .. } => *id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    NotFound {
        request_id: i64,
        error_message: &'static str,
    },
    Stop {
        request_id: i64,
        buses: Vec<String>,
    },
    Bus {
        request_id: i64,
        curvature: f64,
        route_length: u64,
        stop_count: usize,
        unique_stop_count: usize,
    },
    Map {
        request_id: i64,
        map: String,
    },
    Route {
        request_id: i64,
        total_time: f64,
        items: Vec<RouteItem>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum RouteItem {
    Wait { stop_name: String, time: f64 },
    Bus { bus: String, span_count: u32, time: f64 },
}

impl From<&EdgeInfo> for RouteItem {
    fn from(value: &EdgeInfo) -> Self {
        match value {
            EdgeInfo::Wait { stop_name, time } => RouteItem::Wait {
                stop_name: stop_name.to_string(),
                time: *time,
            },
            EdgeInfo::Ride {
                bus_name,
                span_count,
                time,
            } => RouteItem::Bus {
                bus: bus_name.to_string(),
                span_count: *span_count,
                time: *time,
            },
        }
    }
}

fn not_found(request_id: i64) -> Response {
    Response::NotFound {
        request_id,
        error_message: NOT_FOUND,
    }
}

/// Answers a single request against a loaded snapshot.
///
/// Unknown names and missing routes are answered with "not found". An error
/// means the snapshot itself is inconsistent.
pub fn answer(snapshot: &Snapshot, request: &StatRequest) -> Result<Response, CatalogueError> {
    let catalogue = &snapshot.catalogue;
    let request_id = request.id();
    Ok(match request {
        StatRequest::Stop { name, .. } => match catalogue.stop_info(name) {
            None => not_found(request_id),
            Some(info) => Response::Stop {
                request_id,
                buses: info.buses.into_iter().map(str::to_string).collect(),
            },
        },
        StatRequest::Bus { name, .. } => match catalogue.bus_by_name(name) {
            None => not_found(request_id),
            Some(bus_idx) => {
                let info = catalogue.bus_info(bus_idx)?;
                Response::Bus {
                    request_id,
                    curvature: info.curvature(),
                    route_length: info.route_length,
                    stop_count: info.stop_count,
                    unique_stop_count: info.unique_stop_count,
                }
            }
        },
        StatRequest::Map { .. } => Response::Map {
            request_id,
            map: render_map(catalogue, &snapshot.render_settings).to_string(),
        },
        StatRequest::Route { from, to, .. } => {
            match snapshot.router.build_route(catalogue, from, to) {
                None => not_found(request_id),
                Some(route) => Response::Route {
                    request_id,
                    total_time: route.weight,
                    items: snapshot.router.itinerary(&route).map(RouteItem::from).collect(),
                },
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{
        routing::{RoutingSettings, TransportRouter},
        serialization::Snapshot,
        test::sample::{abc_line, render_settings},
    };

    use super::{answer, Response, StatRequest};

    fn snapshot() -> Snapshot {
        let catalogue = abc_line();
        let router = TransportRouter::build(
            &catalogue,
            RoutingSettings {
                bus_wait_time: 5.0,
                bus_velocity: 60.0,
            },
        )
        .unwrap();
        Snapshot {
            catalogue,
            router,
            render_settings: render_settings(),
        }
    }

    fn ask(snapshot: &Snapshot, request: serde_json::Value) -> serde_json::Value {
        let request: StatRequest = serde_json::from_value(request).unwrap();
        serde_json::to_value(answer(snapshot, &request).unwrap()).unwrap()
    }

    #[test]
    fn route_items() {
        let snapshot = snapshot();
        assert_eq!(
            ask(&snapshot, json!({"id": 4, "type": "Route", "from": "A", "to": "C"})),
            json!({
                "request_id": 4,
                "total_time": 7.0,
                "items": [
                    {"type": "Wait", "stop_name": "A", "time": 5.0},
                    {"type": "Bus", "bus": "1", "span_count": 2, "time": 2.0}
                ]
            })
        );
        assert_eq!(
            ask(&snapshot, json!({"id": 5, "type": "Route", "from": "B", "to": "B"})),
            json!({"request_id": 5, "total_time": 0.0, "items": []})
        );
    }

    #[test]
    fn unknown_names_are_not_found() {
        let snapshot = snapshot();
        for request in [
            json!({"id": 1, "type": "Stop", "name": "X"}),
            json!({"id": 1, "type": "Bus", "name": "X"}),
            json!({"id": 1, "type": "Route", "from": "A", "to": "X"}),
        ] {
            assert_eq!(
                ask(&snapshot, request),
                json!({"request_id": 1, "error_message": "not found"})
            );
        }
    }

    #[test]
    fn stop_and_bus_stats() {
        let snapshot = snapshot();
        assert_eq!(
            ask(&snapshot, json!({"id": 2, "type": "Stop", "name": "B"})),
            json!({"request_id": 2, "buses": ["1"]})
        );
        let bus = ask(&snapshot, json!({"id": 3, "type": "Bus", "name": "1"}));
        assert_eq!(bus["route_length"], json!(4000));
        assert_eq!(bus["stop_count"], json!(5));
        assert_eq!(bus["unique_stop_count"], json!(3));
        assert!(bus["curvature"].as_f64().unwrap() > 0.0);
    }

    #[test]
    fn map_is_svg() {
        let snapshot = snapshot();
        let request = StatRequest::Map { id: 9 };
        let Response::Map { request_id, map } = answer(&snapshot, &request).unwrap() else {
            panic!("expected a map");
        };
        assert_eq!(request_id, 9);
        assert!(map.starts_with("<?xml"));
        assert!(map.ends_with("</svg>"));
    }
}
