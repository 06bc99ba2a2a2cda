//! The fixed analysis prompt and chat-completions request template.
//!
//! The persona instruction and the sampling parameters are a contract with
//! the model: the renderer depends on the exact JSON shape the instruction
//! demands, so none of this is configurable per request. The only dynamic
//! parts of an outbound request are the two user inputs, which are embedded
//! verbatim as a text part and an image part.

use advisor_types::NonEmptyText;
use serde::{Deserialize, Serialize};

/// The persona/format instruction sent as the system message of every
/// analysis request. The demanded JSON shape is mirrored by
/// `advisor_types::report`.
pub const SYSTEM_PROMPT: &str = "You are a chinese classical medicine doctor (中医）, who works at an herbal tea shop. When a customer comes in, they will present details about how they are feeling and a picture of their tongue.\n\nYour job will be to recommend one or more chinese herbal medicines to made into an herbal tea drink for the customer given their conditions! You can also help the customer understand why they are being recommended each product in good detail! Give the entire response in chinese, including the names of the herbs. Recommend them in \"君臣佐世\" style.\n\nMake sure you properly analyze the picture of the tongue! No need to mention tea, these ingredients will be made into tea anyways! Write a nice long description of each ingredient you recommend, detailing why this specific ingredient will be beneficial to the customer. Make sure to never address the customer as '患者', refer to them as '用户'. \n\nReturn your response as a JSON object with the following structure and NO OTHER TEXT:\n{\n  \"patientOverview\": {\n    \"primaryConcerns\": \"Description of main health concerns based on symptoms and tongue\",\n    \"tongueAnalysis\": \"Detailed analysis of tongue characteristics\",\n    \"recommendationBasis\": \"Explanation of overall treatment strategy\"\n  },\n  \"herbalFormula\": {\n    \"emperor\": {\n      \"herb\": \"Name of the emperor herb\",\n      \"traditional_name\": \"Chinese name (in chinese)\",\n      \"role\": \"Detailed explanation of why this herb is chosen as the emperor\",\n      \"specific_benefits\": \"How this addresses the patient's main concern\"\n    },\n    \"minister\": {\n      \"herb\": \"Name of the minister herb\",\n      \"traditional_name\": \"Chinese name (in chinese)\",\n      \"role\": \"Detailed explanation of why this herb is chosen as the minister\",\n      \"specific_benefits\": \"How this supports the emperor herb and addresses secondary concerns\"\n    },\n    \"assistant\": {\n      \"herb\": \"Name of the assistant herb\",\n      \"traditional_name\": \"Chinese name(in chinese)\",\n      \"role\": \"Detailed explanation of why this herb is chosen as the assistant\",\n      \"specific_benefits\": \"How this moderates or supports the formula\"\n    },\n    \"courier\": {\n      \"herb\": \"Name of the courier herb\",\n      \"traditional_name\": \"Chinese name(in chinese)\",\n      \"role\": \"Detailed explanation of why this herb is chosen as the courier\",\n      \"specific_benefits\": \"How this helps deliver or harmonize the formula\"\n    }\n  }\n}";

// Fixed sampling parameters.
pub const TEMPERATURE: f32 = 1.0;
pub const MAX_TOKENS: u32 = 7070;
pub const TOP_P: f32 = 1.0;
pub const FREQUENCY_PENALTY: f32 = 0.0;
pub const PRESENCE_PENALTY: f32 = 0.0;

/// A chat-completions request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub response_format: ResponseFormat,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

/// Message content is either a bare string (system message) or a list of
/// typed parts (multimodal user message).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

/// Builds the single outbound request for one analysis: the fixed system
/// prompt, then the user's symptom text and tongue photo embedded verbatim.
pub fn build_request(
    model: &str,
    user_feeling: &NonEmptyText,
    tongue_image: &NonEmptyText,
) -> ChatRequest {
    ChatRequest {
        model: model.to_owned(),
        messages: vec![
            ChatMessage {
                role: "system".into(),
                content: MessageContent::Text(SYSTEM_PROMPT.to_owned()),
            },
            ChatMessage {
                role: "user".into(),
                content: MessageContent::Parts(vec![
                    ContentPart::Text {
                        text: user_feeling.as_str().to_owned(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: tongue_image.as_str().to_owned(),
                        },
                    },
                ]),
            },
        ],
        response_format: ResponseFormat {
            kind: "json_object".into(),
        },
        temperature: TEMPERATURE,
        max_tokens: MAX_TOKENS,
        top_p: TOP_P,
        frequency_penalty: FREQUENCY_PENALTY,
        presence_penalty: PRESENCE_PENALTY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> serde_json::Value {
        let feeling = NonEmptyText::new("咳嗽").unwrap();
        let image = NonEmptyText::new("data:image/jpeg;base64,Zm9v").unwrap();
        serde_json::to_value(build_request("chatgpt-4o-latest", &feeling, &image)).unwrap()
    }

    #[test]
    fn embeds_both_inputs_verbatim() {
        let body = request();
        let parts = &body["messages"][1]["content"];
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[0]["text"], "咳嗽");
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(parts[1]["image_url"]["url"], "data:image/jpeg;base64,Zm9v");
    }

    #[test]
    fn system_message_carries_the_persona_prompt() {
        let body = request();
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], SYSTEM_PROMPT);
    }

    #[test]
    fn sampling_parameters_are_fixed() {
        let body = request();
        assert_eq!(body["temperature"], 1.0);
        assert_eq!(body["max_tokens"], 7070);
        assert_eq!(body["top_p"], 1.0);
        assert_eq!(body["frequency_penalty"], 0.0);
        assert_eq!(body["presence_penalty"], 0.0);
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn prompt_demands_the_rendered_shape() {
        for key in [
            "patientOverview",
            "herbalFormula",
            "emperor",
            "minister",
            "assistant",
            "courier",
            "traditional_name",
            "specific_benefits",
        ] {
            assert!(SYSTEM_PROMPT.contains(key), "prompt missing {key}");
        }
    }
}
