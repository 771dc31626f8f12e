//
// Copyright (c) The Setline Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![warn(rust_2018_idioms)]

pub mod dhcp_relay_group;
pub mod trace_profile;

use setline_engine::identity::{DEFAULT_ROUTING_INSTANCE, Identity, KeySegment};
use setline_engine::resource::Resource;
use setline_engine::schema::Block;

pub use crate::dhcp_relay_group::DhcpRelayGroup;
pub use crate::trace_profile::TraceProfile;

/// Resource types known to this crate, for callers selecting one at runtime.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResourceType {
    DhcpRelayGroup,
    TraceProfile,
}

// ===== impl ResourceType =====

impl ResourceType {
    pub const ALL: [ResourceType; 2] =
        [ResourceType::DhcpRelayGroup, ResourceType::TraceProfile];

    pub fn from_name(name: &str) -> Option<ResourceType> {
        ResourceType::ALL
            .into_iter()
            .find(|resource| resource.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ResourceType::DhcpRelayGroup => DhcpRelayGroup::TYPE_NAME,
            ResourceType::TraceProfile => TraceProfile::TYPE_NAME,
        }
    }

    pub fn schema(&self) -> &'static Block {
        match self {
            ResourceType::DhcpRelayGroup => DhcpRelayGroup::schema(),
            ResourceType::TraceProfile => TraceProfile::schema(),
        }
    }

    pub fn keys(&self) -> &'static [KeySegment] {
        match self {
            ResourceType::DhcpRelayGroup => DhcpRelayGroup::keys(),
            ResourceType::TraceProfile => TraceProfile::keys(),
        }
    }

    pub fn address(&self, identity: &Identity) -> String {
        match self {
            ResourceType::DhcpRelayGroup => DhcpRelayGroup::address(identity),
            ResourceType::TraceProfile => TraceProfile::address(identity),
        }
    }
}

// ===== helper functions =====

// Address prefix of objects living in a non-default routing instance.
pub(crate) fn instance_prefix(identity: &Identity) -> String {
    match identity.get("routing_instance") {
        Some(instance) if instance != DEFAULT_ROUTING_INSTANCE => {
            format!("routing-instances {instance} ")
        }
        _ => String::new(),
    }
}

// An object in a non-default routing instance needs the instance itself.
pub(crate) fn instance_dependencies(identity: &Identity) -> Vec<String> {
    match identity.get("routing_instance") {
        Some(instance) if instance != DEFAULT_ROUTING_INSTANCE => {
            vec![format!("routing-instances {instance}")]
        }
        _ => vec![],
    }
}
