//! Conversions between derivation trees and their serialized records.
//!
//! A record has the shape `{"symbol": "...", "children": [...] | null}` where
//! `null` marks an unexpanded node and `[]` a terminal leaf.

use serde_json as json;

use crate::tree::DerivationTree;

impl DerivationTree {
    /// Convert the tree into its JSON record.
    pub fn to_json(&self) -> Result<json::Value, json::Error> {
        json::to_value(self)
    }
    
    /// Reconstruct a tree from its JSON record.
    pub fn from_json(value: json::Value) -> Result<Self, json::Error> {
        json::from_value(value)
    }
    
    /// Encode the tree into a compact binary form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }
    
    /// Decode a tree that was encoded with [`DerivationTree::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(bytes)
    }
}
