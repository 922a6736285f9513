use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "u8")]
pub enum InteractionType {
    Ping,
    ApplicationCommand,
    MessageComponent,
    ApplicationCommandAutocomplete,
    ModalSubmit,
    Unknown(u8),
}

impl From<u8> for InteractionType {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::Ping,
            2 => Self::ApplicationCommand,
            3 => Self::MessageComponent,
            4 => Self::ApplicationCommandAutocomplete,
            5 => Self::ModalSubmit,
            other => Self::Unknown(other),
        }
    }
}

impl InteractionType {
    pub fn code(self) -> u8 {
        match self {
            Self::Ping => 1,
            Self::ApplicationCommand => 2,
            Self::MessageComponent => 3,
            Self::ApplicationCommandAutocomplete => 4,
            Self::ModalSubmit => 5,
            Self::Unknown(code) => code,
        }
    }
}

/// A verified interaction payload. Field names follow the camelCase convention produced by
/// [`camelize_keys`], never the wire's snake_case. Context fields are lenient: a value of an
/// unexpected shape decodes as absent instead of failing the whole payload.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub application_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: InteractionType,
    #[serde(default, deserialize_with = "lenient")]
    pub data: Option<InteractionData>,
    #[serde(default, deserialize_with = "lenient")]
    pub guild_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub channel_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub member: Option<Member>,
    #[serde(default, deserialize_with = "lenient")]
    pub user: Option<User>,
    #[serde(default, deserialize_with = "lenient")]
    pub token: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub version: Option<u8>,
    #[serde(default, deserialize_with = "lenient")]
    pub locale: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub guild_locale: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionData {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    /// Lookup key for the registry. Non-string names are keyed by their text form, and falsy
    /// values (`null`, `false`, `0`, `""`) count as absent.
    #[serde(default, deserialize_with = "command_name_key")]
    pub name: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient")]
    pub kind: Option<u8>,
    #[serde(default, deserialize_with = "lenient")]
    pub options: Vec<CommandOption>,
    #[serde(default)]
    pub resolved: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub custom_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub target_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandOption {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    pub value: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub options: Vec<CommandOption>,
    #[serde(default, deserialize_with = "lenient")]
    pub focused: Option<bool>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    #[serde(default, deserialize_with = "lenient")]
    pub user: Option<User>,
    #[serde(default, deserialize_with = "lenient")]
    pub roles: Vec<String>,
    /// Permission bitfield serialized as a decimal string. Numeric bitfields are kept as text.
    #[serde(default, deserialize_with = "permission_bits")]
    pub permissions: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub nick: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default, deserialize_with = "lenient")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub global_name: Option<String>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

fn command_name_key<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let key = match Value::deserialize(deserializer)? {
        Value::Null | Value::Bool(false) => None,
        Value::String(name) => Some(name),
        Value::Number(number) if number.as_f64() == Some(0.0) => None,
        Value::Number(number) => Some(number.to_string()),
        other => Some(other.to_string()),
    };
    Ok(key)
}

fn permission_bits<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let bits = match Value::deserialize(deserializer)? {
        Value::String(bits) => Some(bits),
        Value::Number(bits) => Some(bits.to_string()),
        _ => None,
    };
    Ok(bits)
}

impl Interaction {
    /// Command name, treating an empty string the same as an absent one.
    pub fn command_name(&self) -> Option<&str> {
        self.data.as_ref().and_then(|data| data.name.as_deref()).filter(|name| !name.is_empty())
    }

    /// The invoking principal: the guild member's user in guilds, the bare user in DMs.
    pub fn invoker(&self) -> Option<&User> {
        self.member.as_ref().and_then(|member| member.user.as_ref()).or(self.user.as_ref())
    }

    pub fn option(&self, name: &str) -> Option<&CommandOption> {
        self.data.as_ref()?.options.iter().find(|option| option.name == name)
    }
}

impl CommandOption {
    pub fn as_str(&self) -> Option<&str> {
        self.value.as_ref().and_then(Value::as_str)
    }
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("invalid interaction payload: body is not valid UTF-8")]
    NotUtf8,
    #[error("invalid interaction payload: {0}")]
    Json(#[source] serde_json::Error),
    #[error("invalid interaction payload: expected a JSON object")]
    NotAnObject,
    #[error("invalid interaction payload: `type` must be an integer between 0 and 255")]
    MissingType,
    #[error("invalid interaction payload: {0}")]
    Shape(#[source] serde_json::Error),
}

/// A verified, key-normalized payload whose `type` is known but whose other fields have not
/// been decoded yet.
#[derive(Clone, Debug, PartialEq)]
pub struct RawInteraction {
    kind: InteractionType,
    document: Value,
}

impl RawInteraction {
    pub fn kind(&self) -> InteractionType {
        self.kind
    }

    pub fn decode(self) -> Result<Interaction, PayloadError> {
        serde_json::from_value(self.document).map_err(PayloadError::Shape)
    }
}

/// Reads a verified body far enough to classify it. Keys are renamed in a single pass over
/// the whole document before any field is read.
pub fn read_interaction(body: &[u8]) -> Result<RawInteraction, PayloadError> {
    let text = std::str::from_utf8(body).map_err(|_| PayloadError::NotUtf8)?;
    let raw: Value = serde_json::from_str(text).map_err(PayloadError::Json)?;
    if !raw.is_object() {
        return Err(PayloadError::NotAnObject);
    }

    let document = camelize_keys(raw);
    let kind = document
        .get("type")
        .and_then(Value::as_u64)
        .and_then(|code| u8::try_from(code).ok())
        .map(InteractionType::from)
        .ok_or(PayloadError::MissingType)?;

    Ok(RawInteraction { kind, document })
}

pub fn parse_interaction(body: &[u8]) -> Result<Interaction, PayloadError> {
    read_interaction(body)?.decode()
}

pub fn camelize_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter().map(|(key, value)| (camel_case(&key), camelize_keys(value))).collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(camelize_keys).collect()),
        other => other,
    }
}

fn camel_case(key: &str) -> String {
    let mut output = String::with_capacity(key.len());
    let mut upper_next = false;

    for ch in key.chars() {
        if matches!(ch, '_' | '-' | '.') {
            upper_next = true;
            continue;
        }

        if upper_next {
            output.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            output.push(ch);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{camelize_keys, parse_interaction, read_interaction, InteractionType, PayloadError};

    #[test]
    fn camelize_renames_nested_objects_and_arrays() {
        let renamed = camelize_keys(json!({
            "guild_id": "1",
            "member": { "user": { "global_name": "ferris" } },
            "data": { "options": [{ "name": "x", "type": 3, "sub_options": [] }] },
        }));

        assert_eq!(renamed["guildId"], "1");
        assert_eq!(renamed["member"]["user"]["globalName"], "ferris");
        assert!(renamed["data"]["options"][0].get("subOptions").is_some());
        assert!(renamed.get("guild_id").is_none());
    }

    #[test]
    fn camelize_leaves_values_untouched() {
        let renamed = camelize_keys(json!({ "custom_id": "keep_me_snake" }));
        assert_eq!(renamed["customId"], "keep_me_snake");
    }

    #[test]
    fn parses_application_command_with_context() {
        let body = br#"{
            "id": "100",
            "application_id": "200",
            "type": 2,
            "guild_id": "300",
            "channel_id": "400",
            "guild_locale": "de",
            "member": {
                "user": { "id": "500", "username": "ferris" },
                "roles": ["600"],
                "permissions": "8"
            },
            "data": {
                "id": "700",
                "name": "echo",
                "type": 1,
                "options": [{ "name": "text", "type": 3, "value": "hello" }]
            }
        }"#;

        let interaction = parse_interaction(body).expect("parse");

        assert_eq!(interaction.kind, InteractionType::ApplicationCommand);
        assert_eq!(interaction.application_id.as_deref(), Some("200"));
        assert_eq!(interaction.guild_locale.as_deref(), Some("de"));
        assert_eq!(interaction.command_name(), Some("echo"));
        assert_eq!(interaction.invoker().map(|user| user.id.as_str()), Some("500"));
        assert_eq!(interaction.option("text").and_then(|option| option.as_str()), Some("hello"));
    }

    #[test]
    fn empty_command_name_is_treated_as_missing() {
        let interaction =
            parse_interaction(br#"{"type":2,"data":{"name":""}}"#).expect("parse");
        assert_eq!(interaction.command_name(), None);
    }

    #[test]
    fn unknown_interaction_types_are_preserved() {
        let interaction = parse_interaction(br#"{"type":42}"#).expect("parse");
        assert_eq!(interaction.kind, InteractionType::Unknown(42));
        assert_eq!(interaction.kind.code(), 42);
    }

    #[test]
    fn malformed_bodies_are_rejected_with_distinct_errors() {
        assert!(matches!(parse_interaction(&[0xff, 0xfe]), Err(PayloadError::NotUtf8)));
        assert!(matches!(parse_interaction(b"{not json"), Err(PayloadError::Json(_))));
        assert!(matches!(parse_interaction(b"[1,2]"), Err(PayloadError::NotAnObject)));
        assert!(matches!(parse_interaction(br#"{"id":"1"}"#), Err(PayloadError::MissingType)));
        assert!(matches!(parse_interaction(br#"{"type":"1"}"#), Err(PayloadError::MissingType)));
        assert!(matches!(parse_interaction(br#"{"type":300}"#), Err(PayloadError::MissingType)));
    }

    #[test]
    fn classification_reads_only_the_type() {
        let raw = read_interaction(br#"{"type":1,"version":1000,"user":"nobody","data":[]}"#)
            .expect("classify");
        assert_eq!(raw.kind(), InteractionType::Ping);
    }

    #[test]
    fn context_fields_of_unexpected_shape_decode_as_absent() {
        let interaction = parse_interaction(
            br#"{
                "type": 2,
                "version": 1000,
                "locale": 7,
                "user": { "username": "no-id" },
                "member": { "user": { "id": "5" }, "roles": "admin", "permissions": 8 },
                "data": { "name": "echo", "options": { "text": "hi" } }
            }"#,
        )
        .expect("parse");

        assert_eq!(interaction.version, None);
        assert_eq!(interaction.locale, None);
        assert_eq!(interaction.user, None);
        assert_eq!(interaction.invoker().map(|user| user.id.as_str()), Some("5"));
        let member = interaction.member.as_ref().expect("member");
        assert!(member.roles.is_empty());
        assert_eq!(member.permissions.as_deref(), Some("8"));
        assert_eq!(interaction.command_name(), Some("echo"));
        assert!(interaction.option("text").is_none());
    }

    #[test]
    fn command_names_are_keyed_like_lookup_strings() {
        let name_of = |raw: &str| {
            let body = format!(r#"{{"type":2,"data":{{"name":{raw}}}}}"#);
            parse_interaction(body.as_bytes()).expect("parse").command_name().map(str::to_owned)
        };

        assert_eq!(name_of("42"), Some("42".to_owned()));
        assert_eq!(name_of("true"), Some("true".to_owned()));
        assert_eq!(name_of(r#"{"a":1}"#), Some(r#"{"a":1}"#.to_owned()));
        assert_eq!(name_of("0"), None);
        assert_eq!(name_of("false"), None);
        assert_eq!(name_of("null"), None);
    }
}
