use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use log::info;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;
use sqlite::{Connection, OpenFlags, Row, Statement};

use crate::{
    catalogue::{Catalogue, CatalogueError},
    domain::{Bus, BusIdx, Stop, StopIdx},
    geo::Coordinates,
    graph::{EdgeIdx, EdgePayload, FromRawError, Graph, VertexIdx},
    render::RenderSettings,
    routing::{EdgeInfo, RouterFromRawError, RoutingSettings, RoutingSettingsError, TransportRouter},
    shortest_path::{RouteEntry, RouteTable, RouteTableError},
};

/// Bumped whenever the table layout changes.
pub const FORMAT_VERSION: i64 = 1;

const SCHEMA: &str = "
    CREATE TABLE meta (
        format_version INTEGER NOT NULL
    );
    CREATE TABLE stop (
        id INTEGER PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        latitude REAL NOT NULL,
        longitude REAL NOT NULL
    );
    CREATE TABLE bus (
        id INTEGER PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        is_roundtrip INTEGER NOT NULL
    );
    CREATE TABLE bus_stop (
        bus_id INTEGER NOT NULL,
        position INTEGER NOT NULL,
        stop_id INTEGER NOT NULL,
        PRIMARY KEY (bus_id, position)
    );
    CREATE TABLE distance (
        from_stop INTEGER NOT NULL,
        to_stop INTEGER NOT NULL,
        meters INTEGER NOT NULL,
        PRIMARY KEY (from_stop, to_stop)
    );
    CREATE TABLE stop_bus (
        stop_id INTEGER NOT NULL,
        position INTEGER NOT NULL,
        bus_id INTEGER NOT NULL,
        PRIMARY KEY (stop_id, position)
    );
    CREATE TABLE settings (
        bus_wait_time REAL NOT NULL,
        bus_velocity REAL NOT NULL,
        render_settings TEXT NOT NULL
    );
    CREATE TABLE edge (
        id INTEGER PRIMARY KEY NOT NULL,
        from_vertex INTEGER NOT NULL,
        to_vertex INTEGER NOT NULL,
        weight REAL NOT NULL
    );
    CREATE TABLE edge_info (
        id INTEGER PRIMARY KEY NOT NULL,
        kind INTEGER NOT NULL,
        name TEXT NOT NULL,
        span_count INTEGER NOT NULL,
        time REAL NOT NULL
    );
    CREATE TABLE route_entry (
        id INTEGER PRIMARY KEY NOT NULL,
        weight REAL,
        prev_edge INTEGER
    );";

#[derive(FromPrimitive)]
enum DBEdgeKind {
    Wait = 0,
    Ride = 1,
}

/// Everything the serving side needs, restored without rebuilding anything.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub catalogue: Catalogue,
    pub router: TransportRouter,
    pub render_settings: RenderSettings,
}

#[derive(Debug)]
pub enum ExportSnapshotError {
    FileExists(PathBuf),
    CouldNotOpen(sqlite::Error),
    Sqlite(sqlite::Error),
    RenderSettings(serde_json::Error),
}

impl Display for ExportSnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportSnapshotError::FileExists(path) => {
                write!(f, "{} already exists", path.display())
            }
            ExportSnapshotError::CouldNotOpen(err) => write!(f, "could not create snapshot: {err}"),
            ExportSnapshotError::Sqlite(err) => write!(f, "could not write snapshot: {err}"),
            ExportSnapshotError::RenderSettings(err) => {
                write!(f, "could not encode render settings: {err}")
            }
        }
    }
}

impl From<sqlite::Error> for ExportSnapshotError {
    fn from(value: sqlite::Error) -> Self {
        ExportSnapshotError::Sqlite(value)
    }
}

fn step(stmt: &mut Statement) -> Result<(), sqlite::Error> {
    stmt.next()?;
    stmt.reset()
}

/// Writes a snapshot into a new file at `path` in a single transaction.
pub fn export_snapshot(
    path: &Path,
    catalogue: &Catalogue,
    router: &TransportRouter,
    render_settings: &RenderSettings,
) -> Result<(), ExportSnapshotError> {
    if path.exists() {
        return Err(ExportSnapshotError::FileExists(path.to_path_buf()));
    }
    info!("Exporting snapshot to {}...", path.display());
    let render_settings =
        serde_json::to_string(render_settings).map_err(ExportSnapshotError::RenderSettings)?;

    let connection = Connection::open_with_flags(
        path,
        OpenFlags::default()
            .with_create()
            .with_no_mutex()
            .with_read_write(),
    )
    .map_err(ExportSnapshotError::CouldNotOpen)?;
    connection.execute("BEGIN TRANSACTION;")?;
    connection.execute(SCHEMA)?;

    let mut stmt = connection.prepare("INSERT INTO meta (format_version) VALUES (?)")?;
    stmt.bind((1, FORMAT_VERSION))?;
    step(&mut stmt)?;

    let mut stmt =
        connection.prepare("INSERT INTO stop (id, name, latitude, longitude) VALUES (?, ?, ?, ?)")?;
    for (stop_idx, stop) in catalogue.stops() {
        stmt.bind((1, stop_idx.0 as i64))?;
        stmt.bind((2, &*stop.name))?;
        stmt.bind((3, stop.coords.lat))?;
        stmt.bind((4, stop.coords.lng))?;
        step(&mut stmt)?;
    }

    let mut stmt = connection.prepare("INSERT INTO bus (id, name, is_roundtrip) VALUES (?, ?, ?)")?;
    let mut stop_stmt =
        connection.prepare("INSERT INTO bus_stop (bus_id, position, stop_id) VALUES (?, ?, ?)")?;
    for (bus_idx, bus) in catalogue.buses() {
        stmt.bind((1, bus_idx.0 as i64))?;
        stmt.bind((2, &*bus.name))?;
        stmt.bind((3, bus.is_roundtrip as i64))?;
        step(&mut stmt)?;
        for (position, stop_idx) in bus.stops.iter().enumerate() {
            stop_stmt.bind((1, bus_idx.0 as i64))?;
            stop_stmt.bind((2, position as i64))?;
            stop_stmt.bind((3, stop_idx.0 as i64))?;
            step(&mut stop_stmt)?;
        }
    }

    let mut stmt =
        connection.prepare("INSERT INTO distance (from_stop, to_stop, meters) VALUES (?, ?, ?)")?;
    for (from, to, meters) in catalogue.distances().sorted() {
        stmt.bind((1, from.0 as i64))?;
        stmt.bind((2, to.0 as i64))?;
        stmt.bind((3, meters as i64))?;
        step(&mut stmt)?;
    }

    let mut stmt =
        connection.prepare("INSERT INTO stop_bus (stop_id, position, bus_id) VALUES (?, ?, ?)")?;
    for (stop_idx, _) in catalogue.stops() {
        for (position, bus_idx) in catalogue.buses_through_stop(stop_idx).iter().enumerate() {
            stmt.bind((1, stop_idx.0 as i64))?;
            stmt.bind((2, position as i64))?;
            stmt.bind((3, bus_idx.0 as i64))?;
            step(&mut stmt)?;
        }
    }

    let mut stmt = connection.prepare(
        "INSERT INTO settings (bus_wait_time, bus_velocity, render_settings) VALUES (?, ?, ?)",
    )?;
    stmt.bind((1, router.settings().bus_wait_time))?;
    stmt.bind((2, router.settings().bus_velocity))?;
    stmt.bind((3, render_settings.as_str()))?;
    step(&mut stmt)?;

    let mut stmt = connection
        .prepare("INSERT INTO edge (id, from_vertex, to_vertex, weight) VALUES (?, ?, ?, ?)")?;
    let mut info_stmt = connection.prepare(
        "INSERT INTO edge_info (id, kind, name, span_count, time) VALUES (?, ?, ?, ?, ?)",
    )?;
    for ((edge_idx, edge), edge_info) in router.graph().edges().zip(router.edge_infos()) {
        stmt.bind((1, edge_idx.0 as i64))?;
        stmt.bind((2, edge.from.0 as i64))?;
        stmt.bind((3, edge.to.0 as i64))?;
        stmt.bind((4, edge.weight))?;
        step(&mut stmt)?;

        info_stmt.bind((1, edge_idx.0 as i64))?;
        info_stmt.bind((
            2,
            match edge_info {
                EdgeInfo::Wait { .. } => DBEdgeKind::Wait,
                EdgeInfo::Ride { .. } => DBEdgeKind::Ride,
            } as i64,
        ))?;
        info_stmt.bind((3, edge_info.name()))?;
        info_stmt.bind((4, edge_info.span_count() as i64))?;
        info_stmt.bind((5, edge_info.time()))?;
        step(&mut info_stmt)?;
    }

    let mut stmt =
        connection.prepare("INSERT INTO route_entry (id, weight, prev_edge) VALUES (?, ?, ?)")?;
    for (id, entry) in router.table().entries().iter().enumerate() {
        stmt.bind((1, id as i64))?;
        stmt.bind((2, entry.map(|it| it.weight)))?;
        stmt.bind((3, entry.and_then(|it| it.prev_edge).map(|it| it.0 as i64)))?;
        step(&mut stmt)?;
    }

    connection.execute("END TRANSACTION;")?;
    info!(
        "Exported {} stops, {} buses, {} edges and {} route entries",
        catalogue.num_stops(),
        catalogue.num_buses(),
        router.graph().num_edges(),
        router.table().entries().len()
    );
    Ok(())
}

#[derive(Debug)]
pub enum ImportSnapshotError {
    CouldNotOpen(sqlite::Error),
    Sqlite(sqlite::Error),
    UnsupportedVersion { version: i64 },
    MissingRow { table: &'static str },
    MissingIndex { table: &'static str, idx: u32, got_index: i64 },
    DuplicateIndex { table: &'static str, idx: u32 },
    MissingPosition { table: &'static str, owner: i64, position: u32 },
    OwnerOutOfRange { table: &'static str, owner: i64 },
    InvalidEdgeKind { edge_id: u32, kind: i64 },
    ValueOutOfRange { table: &'static str, column: &'static str, value: i64 },
    InvalidRoutingSettings(RoutingSettingsError),
    InvalidRenderSettings(serde_json::Error),
    InvalidCatalogue(CatalogueError),
    InvalidGraph(FromRawError),
    InvalidRouteTable(RouteTableError),
    InvalidRouter(RouterFromRawError),
}

impl Display for ImportSnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportSnapshotError::CouldNotOpen(err) => write!(f, "could not open snapshot: {err}"),
            ImportSnapshotError::Sqlite(err) => write!(f, "could not read snapshot: {err}"),
            ImportSnapshotError::UnsupportedVersion { version } => write!(
                f,
                "snapshot has format version {version}, expected {FORMAT_VERSION}"
            ),
            ImportSnapshotError::MissingRow { table } => write!(f, "table {table} is empty"),
            ImportSnapshotError::MissingIndex {
                table,
                idx,
                got_index,
            } => write!(f, "table {table} has no row {idx} (next is {got_index})"),
            ImportSnapshotError::DuplicateIndex { table, idx } => {
                write!(f, "table {table} has row {idx} more than once")
            }
            ImportSnapshotError::MissingPosition {
                table,
                owner,
                position,
            } => write!(f, "table {table} lacks position {position} of {owner}"),
            ImportSnapshotError::OwnerOutOfRange { table, owner } => {
                write!(f, "table {table} refers to unknown owner {owner}")
            }
            ImportSnapshotError::InvalidEdgeKind { edge_id, kind } => {
                write!(f, "edge {edge_id} has unknown kind {kind}")
            }
            ImportSnapshotError::ValueOutOfRange {
                table,
                column,
                value,
            } => write!(f, "table {table} has {column} {value} out of range"),
            ImportSnapshotError::InvalidRoutingSettings(err) => write!(f, "{err}"),
            ImportSnapshotError::InvalidRenderSettings(err) => {
                write!(f, "could not decode render settings: {err}")
            }
            ImportSnapshotError::InvalidCatalogue(err) => write!(f, "{err}"),
            ImportSnapshotError::InvalidGraph(err) => write!(f, "{err}"),
            ImportSnapshotError::InvalidRouteTable(err) => write!(f, "{err}"),
            ImportSnapshotError::InvalidRouter(err) => write!(f, "{err}"),
        }
    }
}

fn read_rows<T>(
    connection: &Connection,
    query: &str,
    mut read: impl FnMut(usize, &Row) -> Result<T, ImportSnapshotError>,
) -> Result<Vec<T>, ImportSnapshotError> {
    connection
        .prepare(query)
        .map_err(ImportSnapshotError::Sqlite)?
        .iter()
        .enumerate()
        .map(|(idx, it)| match it {
            Err(it) => Err(ImportSnapshotError::Sqlite(it)),
            Ok(it) => read(idx, &it),
        })
        .collect()
}

/// Rows of tables keyed by a dense id must come in `ORDER BY id ASC`.
fn check_index(table: &'static str, idx: usize, id: i64) -> Result<(), ImportSnapshotError> {
    if id > idx as i64 {
        Err(ImportSnapshotError::MissingIndex {
            table,
            idx: idx as u32,
            got_index: id,
        })
    } else if id < idx as i64 {
        Err(ImportSnapshotError::DuplicateIndex {
            table,
            idx: idx as u32,
        })
    } else {
        Ok(())
    }
}

fn read_column<'l, T>(row: &'l Row, column: usize) -> Result<T, ImportSnapshotError>
where
    T: TryFrom<&'l sqlite::Value, Error = sqlite::Error>,
{
    row.try_read::<T, _>(column)
        .map_err(ImportSnapshotError::Sqlite)
}

fn read_u32(
    row: &Row,
    column_idx: usize,
    table: &'static str,
    column: &'static str,
) -> Result<u32, ImportSnapshotError> {
    let value = read_column::<i64>(row, column_idx)?;
    to_u32(table, column, value)
}

fn to_u32(
    table: &'static str,
    column: &'static str,
    value: i64,
) -> Result<u32, ImportSnapshotError> {
    u32::try_from(value).map_err(|_| ImportSnapshotError::ValueOutOfRange {
        table,
        column,
        value,
    })
}

/// Reads `(owner, position, item)` rows sorted by owner and position into one
/// list per owner.
fn read_positions(
    connection: &Connection,
    table: &'static str,
    item_column: &'static str,
    query: &str,
    num_owners: usize,
) -> Result<Vec<Vec<u32>>, ImportSnapshotError> {
    let mut lists: Vec<Vec<u32>> = vec![Vec::new(); num_owners];
    let rows = read_rows(connection, query, |_, row| {
        Ok((
            read_column::<i64>(row, 0)?,
            read_column::<i64>(row, 1)?,
            read_column::<i64>(row, 2)?,
        ))
    })?;
    for (owner, position, item) in rows {
        let list = usize::try_from(owner)
            .ok()
            .and_then(|it| lists.get_mut(it))
            .ok_or(ImportSnapshotError::OwnerOutOfRange { table, owner })?;
        if position != list.len() as i64 {
            return Err(ImportSnapshotError::MissingPosition {
                table,
                owner,
                position: list.len() as u32,
            });
        }
        list.push(to_u32(table, item_column, item)?);
    }
    Ok(lists)
}

pub fn import_snapshot(path: &Path) -> Result<Snapshot, ImportSnapshotError> {
    info!("Importing snapshot from {}...", path.display());
    let connection =
        Connection::open_with_flags(path, OpenFlags::default().with_read_only())
            .map_err(ImportSnapshotError::CouldNotOpen)?;

    let version = read_rows(&connection, "SELECT format_version FROM meta;", |_, row| {
        read_column::<i64>(row, 0)
    })?
    .into_iter()
    .next()
    .ok_or(ImportSnapshotError::MissingRow { table: "meta" })?;
    if version != FORMAT_VERSION {
        return Err(ImportSnapshotError::UnsupportedVersion { version });
    }

    let stops = read_rows(
        &connection,
        "SELECT id, name, latitude, longitude FROM stop ORDER BY id ASC;",
        |idx, row| {
            check_index("stop", idx, read_column(row, 0)?)?;
            Ok(Stop {
                name: read_column::<&str>(row, 1)?.into(),
                coords: Coordinates::new(read_column(row, 2)?, read_column(row, 3)?),
            })
        },
    )?;

    let db_buses = read_rows(
        &connection,
        "SELECT id, name, is_roundtrip FROM bus ORDER BY id ASC;",
        |idx, row| {
            check_index("bus", idx, read_column(row, 0)?)?;
            let name: Box<str> = read_column::<&str>(row, 1)?.into();
            let is_roundtrip = read_column::<i64>(row, 2)? != 0;
            Ok((name, is_roundtrip))
        },
    )?;
    let bus_stops = read_positions(
        &connection,
        "bus_stop",
        "stop_id",
        "SELECT bus_id, position, stop_id FROM bus_stop ORDER BY bus_id ASC, position ASC;",
        db_buses.len(),
    )?;
    let buses = db_buses
        .into_iter()
        .zip(bus_stops)
        .map(|((name, is_roundtrip), stops)| Bus {
            name,
            stops: stops.into_iter().map(StopIdx).collect(),
            is_roundtrip,
        })
        .collect_vec();

    let distances = read_rows(
        &connection,
        "SELECT from_stop, to_stop, meters FROM distance;",
        |_, row| {
            Ok((
                StopIdx(read_u32(row, 0, "distance", "from_stop")?),
                StopIdx(read_u32(row, 1, "distance", "to_stop")?),
                read_u32(row, 2, "distance", "meters")?,
            ))
        },
    )?;

    let buses_by_stop = read_positions(
        &connection,
        "stop_bus",
        "bus_id",
        "SELECT stop_id, position, bus_id FROM stop_bus ORDER BY stop_id ASC, position ASC;",
        stops.len(),
    )?
    .into_iter()
    .enumerate()
    .map(|(idx, buses)| {
        (
            StopIdx(idx as u32),
            buses.into_iter().map(BusIdx).collect_vec(),
        )
    })
    .collect_vec();

    let num_vertices = stops.len() * 2;
    let catalogue = Catalogue::from_raw(stops, buses, distances, buses_by_stop)
        .map_err(ImportSnapshotError::InvalidCatalogue)?;

    let (settings, render_settings) = read_rows(
        &connection,
        "SELECT bus_wait_time, bus_velocity, render_settings FROM settings;",
        |_, row| {
            let settings = RoutingSettings {
                bus_wait_time: read_column(row, 0)?,
                bus_velocity: read_column(row, 1)?,
            };
            let render_settings: RenderSettings =
                serde_json::from_str(read_column::<&str>(row, 2)?)
                    .map_err(ImportSnapshotError::InvalidRenderSettings)?;
            Ok((settings, render_settings))
        },
    )?
    .into_iter()
    .next()
    .ok_or(ImportSnapshotError::MissingRow { table: "settings" })?;
    settings
        .validate()
        .map_err(ImportSnapshotError::InvalidRoutingSettings)?;

    let edges = read_rows(
        &connection,
        "SELECT id, from_vertex, to_vertex, weight FROM edge ORDER BY id ASC;",
        |idx, row| {
            check_index("edge", idx, read_column(row, 0)?)?;
            Ok(EdgePayload {
                from: VertexIdx(read_u32(row, 1, "edge", "from_vertex")?),
                to: VertexIdx(read_u32(row, 2, "edge", "to_vertex")?),
                weight: read_column::<f64>(row, 3)?,
            })
        },
    )?;
    let graph =
        Graph::try_from_raw(num_vertices, edges).map_err(ImportSnapshotError::InvalidGraph)?;

    let edge_infos = read_rows(
        &connection,
        "SELECT id, kind, name, span_count, time FROM edge_info ORDER BY id ASC;",
        |idx, row| {
            check_index("edge_info", idx, read_column(row, 0)?)?;
            let kind: i64 = read_column(row, 1)?;
            let kind = DBEdgeKind::from_i64(kind).ok_or(ImportSnapshotError::InvalidEdgeKind {
                edge_id: idx as u32,
                kind,
            })?;
            let name: Box<str> = read_column::<&str>(row, 2)?.into();
            let time: f64 = read_column(row, 4)?;
            Ok(match kind {
                DBEdgeKind::Wait => EdgeInfo::Wait {
                    stop_name: name,
                    time,
                },
                DBEdgeKind::Ride => EdgeInfo::Ride {
                    bus_name: name,
                    span_count: read_u32(row, 3, "edge_info", "span_count")?,
                    time,
                },
            })
        },
    )?;

    let entries = read_rows(
        &connection,
        "SELECT id, weight, prev_edge FROM route_entry ORDER BY id ASC;",
        |idx, row| {
            check_index("route_entry", idx, read_column(row, 0)?)?;
            let weight: Option<f64> = read_column(row, 1)?;
            let prev_edge = read_column::<Option<i64>>(row, 2)?
                .map(|it| to_u32("route_entry", "prev_edge", it).map(EdgeIdx))
                .transpose()?;
            Ok(weight.map(|weight| RouteEntry { weight, prev_edge }))
        },
    )?;
    let table =
        RouteTable::try_from_raw(&graph, entries).map_err(ImportSnapshotError::InvalidRouteTable)?;

    let router = TransportRouter::from_raw(settings, graph, edge_infos, table)
        .map_err(ImportSnapshotError::InvalidRouter)?;
    info!(
        "Imported {} stops, {} buses and {} edges",
        catalogue.num_stops(),
        catalogue.num_buses(),
        router.graph().num_edges()
    );
    Ok(Snapshot {
        catalogue,
        router,
        render_settings,
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use itertools::Itertools;
    use sqlite::Connection;

    use crate::{
        routing::{RoutingSettings, TransportRouter},
        test::sample::{abc_line, hub_network, render_settings},
    };

    use super::{export_snapshot, import_snapshot, ExportSnapshotError, ImportSnapshotError};

    fn settings() -> RoutingSettings {
        RoutingSettings {
            bus_wait_time: 6.0,
            bus_velocity: 40.0,
        }
    }

    fn write_hub_network(path: &Path) -> TransportRouter {
        let catalogue = hub_network();
        let router = TransportRouter::build(&catalogue, settings()).unwrap();
        export_snapshot(path, &catalogue, &router, &render_settings()).unwrap();
        router
    }

    #[test]
    fn round_trip_keeps_every_route() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("base.db");
        let catalogue = hub_network();
        let router = TransportRouter::build(&catalogue, settings()).unwrap();
        export_snapshot(&path, &catalogue, &router, &render_settings()).unwrap();

        let snapshot = import_snapshot(&path).unwrap();
        assert_eq!(snapshot.render_settings, render_settings());
        assert_eq!(snapshot.router.settings(), router.settings());
        assert_eq!(snapshot.router.edge_infos(), router.edge_infos());
        assert_eq!(snapshot.router.table().entries(), router.table().entries());
        assert_eq!(
            snapshot.catalogue.stops().collect_vec(),
            catalogue.stops().collect_vec()
        );
        assert_eq!(
            snapshot.catalogue.buses().collect_vec(),
            catalogue.buses().collect_vec()
        );

        for ((_, from), (_, to)) in catalogue.stops().cartesian_product(catalogue.stops()) {
            let expected = router.build_route(&catalogue, &from.name, &to.name);
            let restored = snapshot
                .router
                .build_route(&snapshot.catalogue, &from.name, &to.name);
            assert_eq!(restored, expected, "{} -> {}", from.name, to.name);
            if let Some(route) = restored {
                let steps = snapshot.router.itinerary(&route).collect_vec();
                let expected_steps = router
                    .itinerary(expected.as_ref().unwrap())
                    .collect_vec();
                assert_eq!(steps, expected_steps);
            }
        }

        for (stop_idx, stop) in catalogue.stops() {
            assert_eq!(
                snapshot.catalogue.stop_info(&stop.name),
                catalogue.stop_info(&stop.name)
            );
            assert_eq!(
                snapshot.catalogue.buses_through_stop(stop_idx),
                catalogue.buses_through_stop(stop_idx)
            );
        }
        for (bus_idx, _) in catalogue.buses() {
            assert_eq!(
                snapshot.catalogue.bus_info(bus_idx),
                catalogue.bus_info(bus_idx)
            );
        }
    }

    #[test]
    fn back_and_forth_line_survives() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc.db");
        let catalogue = abc_line();
        let router = TransportRouter::build(&catalogue, settings()).unwrap();
        export_snapshot(&path, &catalogue, &router, &render_settings()).unwrap();

        let snapshot = import_snapshot(&path).unwrap();
        let bus = snapshot.catalogue.bus_by_name("1").unwrap();
        assert!(!snapshot.catalogue.bus(bus).is_roundtrip);
        assert_eq!(snapshot.catalogue.bus(bus).stops.len(), 5);
        assert_eq!(
            snapshot.router.build_route(&snapshot.catalogue, "C", "A"),
            router.build_route(&catalogue, "C", "A")
        );
    }

    #[test]
    fn refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("base.db");
        let router = write_hub_network(&path);
        let err = export_snapshot(&path, &hub_network(), &router, &render_settings()).unwrap_err();
        assert!(matches!(err, ExportSnapshotError::FileExists(_)));
    }

    #[test]
    fn missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = import_snapshot(&dir.path().join("nothing.db")).unwrap_err();
        assert!(matches!(err, ImportSnapshotError::CouldNotOpen(_)));
    }

    #[test]
    fn missing_route_entry_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("base.db");
        write_hub_network(&path);
        Connection::open(&path)
            .unwrap()
            .execute("DELETE FROM route_entry WHERE id = 3;")
            .unwrap();
        let err = import_snapshot(&path).unwrap_err();
        assert!(matches!(
            err,
            ImportSnapshotError::MissingIndex {
                table: "route_entry",
                idx: 3,
                got_index: 4
            }
        ));
    }

    #[test]
    fn dangling_edge_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("base.db");
        write_hub_network(&path);
        Connection::open(&path)
            .unwrap()
            .execute("UPDATE edge SET to_vertex = 1000 WHERE id = 0;")
            .unwrap();
        let err = import_snapshot(&path).unwrap_err();
        assert!(matches!(err, ImportSnapshotError::InvalidGraph(_)));
    }

    #[test]
    fn truncated_edge_info_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("base.db");
        let router = write_hub_network(&path);
        let last = router.graph().num_edges() - 1;
        Connection::open(&path)
            .unwrap()
            .execute(format!("DELETE FROM edge_info WHERE id = {last};"))
            .unwrap();
        let err = import_snapshot(&path).unwrap_err();
        assert!(matches!(err, ImportSnapshotError::InvalidRouter(_)));
    }

    #[test]
    fn negative_distance_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("base.db");
        write_hub_network(&path);
        Connection::open(&path)
            .unwrap()
            .execute("UPDATE distance SET meters = -5;")
            .unwrap();
        let err = import_snapshot(&path).unwrap_err();
        assert!(matches!(
            err,
            ImportSnapshotError::ValueOutOfRange {
                table: "distance",
                column: "meters",
                value: -5
            }
        ));
    }

    #[test]
    fn oversized_span_count_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("base.db");
        write_hub_network(&path);
        Connection::open(&path)
            .unwrap()
            .execute("UPDATE edge_info SET span_count = 5000000000 WHERE kind = 1;")
            .unwrap();
        let err = import_snapshot(&path).unwrap_err();
        assert!(matches!(
            err,
            ImportSnapshotError::ValueOutOfRange {
                table: "edge_info",
                column: "span_count",
                value: 5_000_000_000
            }
        ));
    }

    #[test]
    fn unknown_version_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("base.db");
        write_hub_network(&path);
        Connection::open(&path)
            .unwrap()
            .execute("UPDATE meta SET format_version = 99;")
            .unwrap();
        let err = import_snapshot(&path).unwrap_err();
        assert!(matches!(
            err,
            ImportSnapshotError::UnsupportedVersion { version: 99 }
        ));
    }
}
