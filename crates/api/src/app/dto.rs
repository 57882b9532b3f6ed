use serde::{Deserialize, Serialize};

use lithos_core::{DomainResult, GeologicalClass, JobId, JobState, SectionRecord};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct ClassRequest {
    pub name: String,
    pub code: String,
}

impl ClassRequest {
    /// Convert to a class, rejecting a blank name or code.
    pub fn into_class(self) -> DomainResult<GeologicalClass> {
        GeologicalClass::validated(self.name, self.code)
    }
}

#[derive(Debug, Deserialize)]
pub struct SectionRequest {
    pub name: String,
    #[serde(rename = "geologicalClasses", default)]
    pub classes: Vec<ClassRequest>,
}

impl SectionRequest {
    /// Convert to a record, rejecting blank names and codes.
    pub fn into_record(self) -> DomainResult<SectionRecord> {
        let classes = self
            .classes
            .into_iter()
            .map(|c| GeologicalClass::new(c.name, c.code))
            .collect();
        SectionRecord::validated(self.name, classes)
    }
}

#[derive(Debug, Deserialize)]
pub struct ClassCodeQuery {
    pub code: String,
}

/// Owning section of a class being created. Parsed by the handler so a bad
/// value gets the usual JSON error.
#[derive(Debug, Deserialize)]
pub struct SectionIdQuery {
    #[serde(rename = "sectionId")]
    pub section_id: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct JobCreatedResponse {
    pub id: JobId,
}

#[derive(Debug, Serialize)]
pub struct JobStateResponse {
    pub state: JobState,
}

// -------------------------
// Path parsing
// -------------------------

/// Parse a numeric resource id from the path. Malformed ids are a 400.
pub fn parse_id<T>(raw: &str, what: &'static str) -> Result<T, axum::response::Response>
where
    T: std::str::FromStr,
{
    raw.parse().map_err(|_| {
        errors::json_error(
            axum::http::StatusCode::BAD_REQUEST,
            "invalid_id",
            format!("invalid {what} id: {raw}"),
        )
    })
}

/// Parse a job id from the path.
///
/// Job ids are opaque to clients, so a malformed one names no job: 404.
pub fn parse_job_id(raw: &str) -> Result<JobId, axum::response::Response> {
    raw.parse().map_err(|_| {
        errors::json_error(
            axum::http::StatusCode::NOT_FOUND,
            "not_found",
            format!("job {raw} not found"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_request_validates() {
        let ok: SectionRequest = serde_json::from_value(serde_json::json!({
            "name": "S1",
            "geologicalClasses": [{"name": "Sandstone", "code": "SS"}]
        }))
        .unwrap();
        let record = ok.into_record().unwrap();
        assert_eq!(record.classes[0].code, "SS");

        let blank: SectionRequest = serde_json::from_value(serde_json::json!({
            "name": "S1",
            "geologicalClasses": [{"name": "Sandstone", "code": " "}]
        }))
        .unwrap();
        assert!(blank.into_record().is_err());
    }

    #[test]
    fn classes_default_to_empty() {
        let req: SectionRequest =
            serde_json::from_value(serde_json::json!({"name": "S"})).unwrap();
        assert!(req.into_record().unwrap().classes.is_empty());
    }

    #[test]
    fn class_request_validates() {
        let ok: ClassRequest =
            serde_json::from_value(serde_json::json!({"name": "Clay", "code": "CL"})).unwrap();
        assert_eq!(ok.into_class().unwrap(), GeologicalClass::new("Clay", "CL"));

        let blank: ClassRequest =
            serde_json::from_value(serde_json::json!({"name": "", "code": "CL"})).unwrap();
        assert!(blank.into_class().is_err());
    }

    #[test]
    fn malformed_job_id_is_not_found() {
        let resp = parse_job_id("not-a-uuid").unwrap_err();
        assert_eq!(resp.status(), axum::http::StatusCode::NOT_FOUND);

        let id = JobId::new();
        assert_eq!(parse_job_id(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn malformed_section_id_is_a_bad_request() {
        let resp = parse_id::<lithos_core::SectionId>("abc", "section").unwrap_err();
        assert_eq!(resp.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn job_state_uses_wire_names() {
        let body = serde_json::to_value(JobStateResponse {
            state: JobState::InProgress,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"state": "IN_PROGRESS"}));
    }
}
