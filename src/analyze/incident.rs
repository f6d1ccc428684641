// src/analyze/incident.rs
//! Structured incident extraction contract: schema, prompt, and typed result.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::analyze::ai_adapter::{ChatMessage, JsonSchemaSpec};

pub const INCIDENT_SCHEMA_NAME: &str = "newsAnalysisSchema";

pub const EXTRACTION_PROMPT: &str = "Extract key information from the news article, especially location details including geographic coordinates (latitude and longitude) when possible. For German locations, try to determine the coordinates based on the mentioned town, street, and other location details. If any information is not available, use null for that field.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentLocation {
    pub town: String,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

/// Model-derived summary of one press release.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredIncident {
    pub summary: String,
    pub location: IncidentLocation,
    pub incident: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub key_persons: Vec<String>,
}

/// The JSON schema declared to the model.
pub fn incident_schema() -> JsonSchemaSpec {
    JsonSchemaSpec {
        name: INCIDENT_SCHEMA_NAME.to_string(),
        schema: incident_schema_value(),
    }
}

fn incident_schema_value() -> Value {
    json!({
        "type": "object",
        "properties": {
            "summary": {
                "type": "string",
                "description": "A concise summary of the news article"
            },
            "location": {
                "type": "object",
                "properties": {
                    "town": {
                        "type": "string",
                        "description": "The town/city where the incident occurred"
                    },
                    "street": {
                        "type": "string",
                        "description": "The street name where the incident occurred, if mentioned"
                    },
                    "zipCode": {
                        "type": "string",
                        "description": "The postal/zip code of the location, if mentioned"
                    },
                    "coordinates": {
                        "type": "object",
                        "properties": {
                            "latitude": {
                                "type": "number",
                                "description": "The latitude coordinate of the incident location"
                            },
                            "longitude": {
                                "type": "number",
                                "description": "The longitude coordinate of the incident location"
                            }
                        },
                        "description": "Geographic coordinates of the incident location if it can be determined"
                    }
                },
                "required": ["town"]
            },
            "incident": {
                "type": "string",
                "description": "Description of what happened"
            },
            "date": {
                "type": "string",
                "description": "When the incident occurred (date and time if available)"
            },
            "key_persons": {
                "type": "array",
                "items": {
                    "type": "string",
                    "description": "Names or descriptions of key people involved (e.g., 'male suspect aged 25')"
                }
            }
        },
        "required": ["summary", "location", "incident"]
    })
}

/// Caller messages followed by the extraction instruction.
pub fn extraction_messages(messages: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut out = messages.to_vec();
    out.push(ChatMessage::system(EXTRACTION_PROMPT));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_requires_core_fields() {
        let s = incident_schema();
        assert_eq!(s.name, "newsAnalysisSchema");
        assert_eq!(s.schema["required"], json!(["summary", "location", "incident"]));
        assert_eq!(s.schema["properties"]["location"]["required"], json!(["town"]));
    }

    #[test]
    fn extraction_prompt_is_appended_last() {
        let msgs = extraction_messages(&[ChatMessage::user("Raub in Potsdam")]);
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[1].role, "system");
        assert!(msgs[1].content.as_deref().unwrap().starts_with("Extract key information"));
    }

    #[test]
    fn incident_tolerates_nulls_for_optional_fields() {
        let v = json!({
            "summary": "Raub an Tankstelle",
            "location": {"town": "Potsdam", "street": null, "zipCode": "14467",
                         "coordinates": {"latitude": 52.39, "longitude": 13.06}},
            "incident": "Bewaffneter Raub",
            "date": null,
            "key_persons": ["männlicher Tatverdächtiger, ca. 25 Jahre"]
        });
        let inc: StructuredIncident = serde_json::from_value(v).unwrap();
        assert_eq!(inc.location.town, "Potsdam");
        assert_eq!(inc.location.zip_code.as_deref(), Some("14467"));
        assert!(inc.date.is_none());
        assert_eq!(inc.key_persons.len(), 1);
    }
}
