//! Navigation between dashboard sections, gated by permissions.

use domus_core::{Actions, PermissionTable, Role, Section};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavError {
    #[error("Role {role:?} may not open section '{}'", .section.title())]
    Forbidden { role: Role, section: Section },
    #[error("Role {role:?} has no readable sections")]
    NoSections { role: Role },
}

#[derive(Debug, Clone)]
pub struct Navigator {
    role: Role,
    permissions: PermissionTable,
    sections: Vec<Section>,
    active: Section,
}

impl Navigator {
    pub fn new(role: Role, permissions: PermissionTable) -> Result<Self, NavError> {
        let sections = permissions.readable_sections(role);
        let active = *sections.first().ok_or(NavError::NoSections { role })?;
        Ok(Self {
            role,
            permissions,
            sections,
            active,
        })
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn active(&self) -> Section {
        self.active
    }

    /// Sections this role may open, in navigation order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn can(&self, section: Section, action: Actions) -> bool {
        self.permissions.allows(self.role, section, action)
    }

    pub fn ensure(&self, section: Section, action: Actions) -> Result<(), NavError> {
        if self.can(section, action) {
            Ok(())
        } else {
            Err(NavError::Forbidden {
                role: self.role,
                section,
            })
        }
    }

    pub fn go(&mut self, section: Section) -> Result<(), NavError> {
        self.ensure(section, Actions::READ)?;
        self.active = section;
        Ok(())
    }

    fn index(&self) -> usize {
        self.sections
            .iter()
            .position(|s| *s == self.active)
            .unwrap_or(0)
    }

    pub fn next(&mut self) -> Section {
        let next = (self.index() + 1) % self.sections.len();
        self.active = self.sections[next];
        self.active
    }

    pub fn previous(&mut self) -> Section {
        let idx = self.index();
        let prev = if idx == 0 {
            self.sections.len() - 1
        } else {
            idx - 1
        };
        self.active = self.sections[prev];
        self.active
    }
}
