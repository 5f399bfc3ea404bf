//! Background message protocol.
//!
//! On the wire every request is a JSON object with an `action` field; every
//! reply is `{success, ...}` except `getConfig`, which answers with the bare
//! settings object.
use proxykit_containers::{ContainerIdentity, ContainerInfo, IpInfo};
use proxykit_generator::GeneratorOptions;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const UNKNOWN_ACTION: &str = "Unknown action";

const ACTIONS: [&str; 7] = [
    "getConfig",
    "saveConfig",
    "createContainer",
    "getContainers",
    "updateIpInfo",
    "getContainerInfo",
    "getAllContainerInfo",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    GetConfig,
    SaveConfig {
        config: GeneratorOptions,
    },
    CreateContainer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
    GetContainers,
    #[serde(rename_all = "camelCase")]
    UpdateIpInfo {
        cookie_store_id: String,
        ip_info: IpInfo,
    },
    #[serde(rename_all = "camelCase")]
    GetContainerInfo {
        cookie_store_id: String,
    },
    GetAllContainerInfo,
}

impl Request {
    /// Decode a raw message. Unknown or missing actions and malformed
    /// payloads come back as the failure reply to send.
    pub fn from_value(value: Value) -> Result<Self, Response> {
        let action = value.get("action").and_then(Value::as_str).unwrap_or_default();
        if !ACTIONS.contains(&action) {
            return Err(Response::Failure(UNKNOWN_ACTION.to_string()));
        }
        let action = action.to_string();
        serde_json::from_value(value)
            .map_err(|e| Response::Failure(format!("Invalid {action} message: {e}")))
    }

    pub fn action(&self) -> &'static str {
        match self {
            Request::GetConfig => "getConfig",
            Request::SaveConfig { .. } => "saveConfig",
            Request::CreateContainer { .. } => "createContainer",
            Request::GetContainers => "getContainers",
            Request::UpdateIpInfo { .. } => "updateIpInfo",
            Request::GetContainerInfo { .. } => "getContainerInfo",
            Request::GetAllContainerInfo => "getAllContainerInfo",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Config(GeneratorOptions),
    Ack,
    Container(ContainerIdentity),
    Containers(Vec<ContainerIdentity>),
    ContainerInfo(Option<ContainerInfo>),
    AllContainerInfo(Vec<ContainerInfo>),
    Failure(String),
}

impl Response {
    pub fn is_success(&self) -> bool {
        !matches!(self, Response::Failure(_))
    }

    pub fn to_value(&self) -> Value {
        match self {
            Response::Config(options) => json!(options),
            Response::Ack => json!({ "success": true }),
            Response::Container(c) => json!({ "success": true, "container": c }),
            Response::Containers(list) => json!({ "success": true, "containers": list }),
            Response::ContainerInfo(info) => json!({ "success": true, "containerInfo": info }),
            Response::AllContainerInfo(list) => json!({ "success": true, "containers": list }),
            Response::Failure(error) => json!({ "success": false, "error": error }),
        }
    }
}
