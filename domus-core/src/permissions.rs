//! Permission lookup consumed by navigation gating.
//!
//! The table is data only: which role may perform which actions in which
//! dashboard section. The rules that populate it live on the server.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

bitflags! {
    /// Actions a role may perform inside a section.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct Actions: u8 {
        const READ = 1 << 0;
        const CREATE = 1 << 1;
        const UPDATE = 1 << 2;
        const DELETE = 1 << 3;
        const WRITE = Self::CREATE.bits() | Self::UPDATE.bits() | Self::DELETE.bits();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    MtkAdmin,
    ComplexManager,
    Dispatcher,
    Viewer,
}

/// Dashboard sections that can be gated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Mtk,
    Complexes,
    Buildings,
    Blocks,
    Properties,
    Residents,
    Users,
    Settings,
}

impl Section {
    pub fn all() -> &'static [Section] {
        &[
            Section::Mtk,
            Section::Complexes,
            Section::Buildings,
            Section::Blocks,
            Section::Properties,
            Section::Residents,
            Section::Users,
            Section::Settings,
        ]
    }

    pub fn title(&self) -> &'static str {
        match self {
            Section::Mtk => "Management companies",
            Section::Complexes => "Complexes",
            Section::Buildings => "Buildings",
            Section::Blocks => "Blocks",
            Section::Properties => "Properties",
            Section::Residents => "Residents",
            Section::Users => "Users",
            Section::Settings => "Settings",
        }
    }
}

/// One row of the permission payload served by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub role: Role,
    pub section: Section,
    pub actions: Actions,
}

/// Role → section → allowed actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionTable {
    grants: HashMap<Role, HashMap<Section, Actions>>,
}

impl PermissionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `actions` to whatever `role` already holds in `section`.
    pub fn grant(&mut self, role: Role, section: Section, actions: Actions) {
        *self
            .grants
            .entry(role)
            .or_default()
            .entry(section)
            .or_default() |= actions;
    }

    pub fn actions(&self, role: Role, section: Section) -> Actions {
        if role == Role::SuperAdmin {
            return Actions::all();
        }
        self.grants
            .get(&role)
            .and_then(|sections| sections.get(&section))
            .copied()
            .unwrap_or_default()
    }

    pub fn allows(&self, role: Role, section: Section, action: Actions) -> bool {
        self.actions(role, section).contains(action)
    }

    /// Sections the role may open, in navigation order.
    pub fn readable_sections(&self, role: Role) -> Vec<Section> {
        Section::all()
            .iter()
            .copied()
            .filter(|section| self.allows(role, *section, Actions::READ))
            .collect()
    }
}

impl FromIterator<PermissionGrant> for PermissionTable {
    fn from_iter<I: IntoIterator<Item = PermissionGrant>>(iter: I) -> Self {
        let mut table = PermissionTable::new();
        for grant in iter {
            table.grant(grant.role, grant.section, grant.actions);
        }
        table
    }
}
