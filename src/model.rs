use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorical skin type labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkinType {
    Oily,
    Dry,
    Combination,
    Normal,
}

impl SkinType {
    /// All labels, in enumeration order
    pub const ALL: [SkinType; 4] = [
        SkinType::Oily,
        SkinType::Dry,
        SkinType::Combination,
        SkinType::Normal,
    ];
}

impl fmt::Display for SkinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SkinType::Oily => "Oily",
            SkinType::Dry => "Dry",
            SkinType::Combination => "Combination",
            SkinType::Normal => "Normal",
        };
        f.write_str(label)
    }
}

/// Detectable skin issue labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Issue {
    Hyperpigmentation,
    Acne,
    Wrinkles,
    Redness,
    #[serde(rename = "Dark Spots")]
    DarkSpots,
}

impl Issue {
    /// All labels, in enumeration order
    pub const ALL: [Issue; 5] = [
        Issue::Hyperpigmentation,
        Issue::Acne,
        Issue::Wrinkles,
        Issue::Redness,
        Issue::DarkSpots,
    ];
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Issue::Hyperpigmentation => "Hyperpigmentation",
            Issue::Acne => "Acne",
            Issue::Wrinkles => "Wrinkles",
            Issue::Redness => "Redness",
            Issue::DarkSpots => "Dark Spots",
        };
        f.write_str(label)
    }
}

/// Durable analysis record for one uploaded image
///
/// A pure function of the image identifier: once derived and persisted
/// it is immutable and returned verbatim on every subsequent request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Identifier of the analyzed image
    pub image_id: String,
    /// Detected skin type
    pub skin_type: SkinType,
    /// 1-3 distinct detected issues
    pub issues: Vec<Issue>,
    /// Confidence score in [0.70, 0.95], rounded to 2 decimals
    pub confidence: f64,
}

/// Response body for the upload endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub image_id: String,
}

/// Request body for the analyze endpoint
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub image_id: String,
}

/// Structured error body returned by all failing endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_serialize_verbatim() {
        assert_eq!(
            serde_json::to_string(&SkinType::Combination).unwrap(),
            "\"Combination\""
        );
        assert_eq!(
            serde_json::to_string(&Issue::DarkSpots).unwrap(),
            "\"Dark Spots\""
        );
    }

    #[test]
    fn test_analysis_result_json_shape() {
        let result = AnalysisResult {
            image_id: "img-1".to_string(),
            skin_type: SkinType::Dry,
            issues: vec![Issue::Acne, Issue::Redness],
            confidence: 0.82,
        };

        let json: serde_json::Value = serde_json::to_value(&result).unwrap();
        assert_eq!(json["image_id"], "img-1");
        assert_eq!(json["skin_type"], "Dry");
        assert_eq!(json["issues"], serde_json::json!(["Acne", "Redness"]));
        assert_eq!(json["confidence"], 0.82);
    }

    #[test]
    fn test_display_matches_serialized_label() {
        for issue in Issue::ALL {
            let json = serde_json::to_value(issue).unwrap();
            assert_eq!(json.as_str().unwrap(), issue.to_string());
        }
    }
}
