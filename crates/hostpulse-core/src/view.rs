//! Which family is on screen, and how navigation input moves it.

use crate::families::FamilyKind;

/// A discrete navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// Show this family.
    SelectFamily(FamilyKind),
    /// Menu-key press for a family: shows it, or cycles its entity when it
    /// is already on screen.
    FamilyKey(FamilyKind),
    NextFamily,
    PreviousFamily,
    NextEntity,
    PreviousEntity,
    /// Focus a named entity of the active family.
    SelectEntity(String),
}

/// Entity movement implied by a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityStep {
    Next,
    Previous,
    Select(String),
}

/// Result of resolving one [`Navigation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub family: FamilyKind,
    pub family_changed: bool,
    pub entity: Option<EntityStep>,
}

/// Holds the active family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewController {
    active: FamilyKind,
}

impl ViewController {
    pub fn new(active: FamilyKind) -> Self {
        Self { active }
    }

    pub fn active(&self) -> FamilyKind {
        self.active
    }

    /// Apply `nav`, returning what changed.
    pub fn navigate(&mut self, nav: Navigation) -> Transition {
        let before = self.active;
        let entity = match nav {
            Navigation::SelectFamily(kind) => {
                self.active = kind;
                None
            }
            Navigation::FamilyKey(kind) => {
                let repeat = kind == self.active && kind.is_multi_entity();
                self.active = kind;
                repeat.then_some(EntityStep::Next)
            }
            Navigation::NextFamily => {
                self.active = self.active.next();
                None
            }
            Navigation::PreviousFamily => {
                self.active = self.active.previous();
                None
            }
            Navigation::NextEntity => Some(EntityStep::Next),
            Navigation::PreviousEntity => Some(EntityStep::Previous),
            Navigation::SelectEntity(name) => Some(EntityStep::Select(name)),
        };
        Transition {
            family: self.active,
            family_changed: before != self.active,
            entity,
        }
    }
}
