use std::{fmt::Display, path::PathBuf};

use log::info;
use serde::Deserialize;

use crate::{
    catalogue::CatalogueError,
    render::{RenderSettings, RenderSettingsError},
    routing::{BuildGraphError, RoutingSettings, TransportRouter},
    serialization::{export_snapshot, import_snapshot, ExportSnapshotError, ImportSnapshotError},
};

pub mod base;
pub mod stat;

pub use base::{load_catalogue, BaseRequest, RequestError};
pub use stat::{answer, Response, StatRequest};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SerializationSettings {
    pub file: PathBuf,
}

/// Input of the build step.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MakeBaseInput {
    pub serialization_settings: SerializationSettings,
    pub routing_settings: Option<RoutingSettings>,
    pub render_settings: Option<RenderSettings>,
    #[serde(default)]
    pub base_requests: Vec<BaseRequest>,
}

/// Input of the serving step.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProcessRequestsInput {
    pub serialization_settings: SerializationSettings,
    #[serde(default)]
    pub stat_requests: Vec<StatRequest>,
}

#[derive(Debug)]
pub enum MakeBaseError {
    MissingRoutingSettings,
    MissingRenderSettings,
    InvalidRenderSettings(RenderSettingsError),
    InvalidRequests(RequestError),
    BuildGraph(BuildGraphError),
    RemoveExisting(std::io::Error),
    Export(ExportSnapshotError),
}

impl Display for MakeBaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MakeBaseError::MissingRoutingSettings => write!(f, "routing_settings are missing"),
            MakeBaseError::MissingRenderSettings => write!(f, "render_settings are missing"),
            MakeBaseError::InvalidRenderSettings(err) => write!(f, "invalid render settings: {err}"),
            MakeBaseError::InvalidRequests(err) => write!(f, "invalid base requests: {err}"),
            MakeBaseError::BuildGraph(err) => write!(f, "could not build routing graph: {err}"),
            MakeBaseError::RemoveExisting(err) => {
                write!(f, "could not remove existing snapshot: {err}")
            }
            MakeBaseError::Export(err) => write!(f, "{err}"),
        }
    }
}

#[derive(Debug)]
pub enum ProcessRequestsError {
    Import(ImportSnapshotError),
    InconsistentCatalogue { request_id: i64, source: CatalogueError },
}

impl Display for ProcessRequestsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessRequestsError::Import(err) => write!(f, "{err}"),
            ProcessRequestsError::InconsistentCatalogue { request_id, source } => {
                write!(f, "request {request_id}: {source}")
            }
        }
    }
}

/// Builds the catalogue and the router and writes them to the snapshot file.
/// An existing file is replaced only if `force` is set.
pub fn make_base(input: &MakeBaseInput, force: bool) -> Result<(), MakeBaseError> {
    let routing_settings = input
        .routing_settings
        .ok_or(MakeBaseError::MissingRoutingSettings)?;
    let render_settings = input
        .render_settings
        .as_ref()
        .ok_or(MakeBaseError::MissingRenderSettings)?;
    render_settings
        .validate()
        .map_err(MakeBaseError::InvalidRenderSettings)?;

    let catalogue =
        load_catalogue(&input.base_requests).map_err(MakeBaseError::InvalidRequests)?;
    let router =
        TransportRouter::build(&catalogue, routing_settings).map_err(MakeBaseError::BuildGraph)?;

    let path = &input.serialization_settings.file;
    if force && path.exists() {
        info!("Replacing existing snapshot {}", path.display());
        std::fs::remove_file(path).map_err(MakeBaseError::RemoveExisting)?;
    }
    export_snapshot(path, &catalogue, &router, render_settings).map_err(MakeBaseError::Export)
}

/// Loads the snapshot and answers every request in order.
pub fn process_requests(input: &ProcessRequestsInput) -> Result<Vec<Response>, ProcessRequestsError> {
    let snapshot = import_snapshot(&input.serialization_settings.file)
        .map_err(ProcessRequestsError::Import)?;
    info!("Answering {} requests", input.stat_requests.len());
    input
        .stat_requests
        .iter()
        .map(|request| {
            answer(&snapshot, request).map_err(|source| {
                ProcessRequestsError::InconsistentCatalogue {
                    request_id: request.id(),
                    source,
                }
            })
        })
        .collect()
}
