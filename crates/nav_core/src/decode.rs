//! Decoder seam between the raw content stream and a renderable tree,
//! plus the JSON decoder used by this repository's demo payloads.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use shared::{
    location::Location,
    tree::{RenderNode, RenderTree},
};
use thiserror::Error;
use url::Url;

use crate::fetch::{ContentStream, FetchError};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("content payload for {location} is not a valid UI description: {source}")]
    Json {
        location: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("client module reference '{reference}' does not resolve: {source}")]
    ModuleRef {
        reference: String,
        #[source]
        source: url::ParseError,
    },
}

#[async_trait]
pub trait TreeDecoder: Send + Sync {
    /// Turns a content stream into a renderable tree. `module_base` is the
    /// URL prefix client-module placeholders are resolved against.
    async fn decode(
        &self,
        stream: ContentStream,
        module_base: &Url,
    ) -> Result<RenderTree, DecodeError>;
}

/// Wire shape of one streamed node, before module resolution.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
enum PayloadNode {
    Text {
        value: String,
    },
    Element {
        tag: String,
        #[serde(default)]
        props: BTreeMap<String, Value>,
        #[serde(default)]
        children: Vec<PayloadNode>,
    },
    Module {
        reference: String,
        #[serde(default)]
        props: BTreeMap<String, Value>,
    },
}

/// Decodes the JSON UI description format. A `module` node carries a
/// relative `reference` of the form `path#export` (export defaults to
/// `default`) which is joined against the module base.
pub struct JsonTreeDecoder;

impl JsonTreeDecoder {
    fn resolve(node: PayloadNode, module_base: &Url) -> Result<RenderNode, DecodeError> {
        match node {
            PayloadNode::Text { value } => Ok(RenderNode::Text { value }),
            PayloadNode::Element {
                tag,
                props,
                children,
            } => Ok(RenderNode::Element {
                tag,
                props,
                children: children
                    .into_iter()
                    .map(|child| Self::resolve(child, module_base))
                    .collect::<Result<_, _>>()?,
            }),
            PayloadNode::Module { reference, props } => {
                let (path, export) = match reference.split_once('#') {
                    Some((path, export)) => (path, export),
                    None => (reference.as_str(), "default"),
                };
                let url =
                    module_base
                        .join(path)
                        .map_err(|source| DecodeError::ModuleRef {
                            reference: reference.clone(),
                            source,
                        })?;
                Ok(RenderNode::Module {
                    url: url.to_string(),
                    export: export.to_string(),
                    props,
                })
            }
        }
    }

    fn parse(location: &Location, payload: &[u8]) -> Result<PayloadNode, DecodeError> {
        serde_json::from_slice(payload).map_err(|source| DecodeError::Json {
            location: location.to_string(),
            source,
        })
    }
}

#[async_trait]
impl TreeDecoder for JsonTreeDecoder {
    async fn decode(
        &self,
        stream: ContentStream,
        module_base: &Url,
    ) -> Result<RenderTree, DecodeError> {
        let location = stream.location().clone();
        let payload = stream.collect_bytes().await?;
        let root = Self::parse(&location, &payload)?;
        Ok(RenderTree::new(Self::resolve(root, module_base)?))
    }
}

#[cfg(test)]
#[path = "tests/decode_tests.rs"]
mod tests;
