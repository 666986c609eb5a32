//! The seam between the view controller and the registry backend.
//!
//! `registro-client` provides the HTTP implementation; tests drive the controller with an
//! in-memory implementation instead.

use crate::error::ApiResult;
use registro_types::{
    ExportFormat, ListQuery, PatientId, PatientPage, PatientPayload, PatientRecord, StatsSnapshot,
};
use std::future::Future;

/// Operations the registry backend exposes to the administrative client.
pub trait RegistryApi: Send + Sync {
    /// Fetches one page of the patient list.
    fn list_patients(&self, query: &ListQuery) -> impl Future<Output = ApiResult<PatientPage>> + Send;

    /// Fetches a single record, failing with `ApiError::NotFound` if it does not exist.
    fn get_patient(&self, id: PatientId) -> impl Future<Output = ApiResult<PatientRecord>> + Send;

    /// Creates a record. The response body carries nothing the client needs.
    fn create_patient(&self, payload: &PatientPayload) -> impl Future<Output = ApiResult<()>> + Send;

    /// Applies a partial update to an existing record.
    fn update_patient(
        &self,
        id: PatientId,
        payload: &PatientPayload,
    ) -> impl Future<Output = ApiResult<()>> + Send;

    /// Deletes a record. Deleting an already-deleted record fails.
    fn delete_patient(&self, id: PatientId) -> impl Future<Output = ApiResult<()>> + Send;

    /// Fetches the aggregate statistics snapshot.
    fn stats(&self) -> impl Future<Output = ApiResult<StatsSnapshot>> + Send;

    /// URL the host navigates to in order to download an export.
    fn export_url(&self, format: ExportFormat) -> String;
}
