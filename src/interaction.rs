//! Pointer and search events translated into focus, layout and host notifications.

use eframe::egui::Vec2;
use tracing::debug;

use crate::context::{PersonInfo, SimulationContext};
use crate::error::Result;
use crate::focus::FocusState;

#[derive(Clone, Debug, PartialEq)]
pub enum InteractionEvent {
    Hover(String),
    Unhover,
    Click(String),
    Search(String),
    ClearSearch,
    ToggleClustering,
    Resize { width: f32, height: f32 },
    DragStart(String),
    DragMove(Vec2),
    DragEnd,
}

/// Notifications for the surrounding application.
#[derive(Clone, Debug, PartialEq)]
pub enum HostEvent {
    MouseOver(String),
    MouseOut,
    Click(String),
    SelectedPersonChanged(Option<PersonInfo>),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    Unselected,
    Selected(String),
}

impl Selection {
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Unselected => None,
            Self::Selected(name) => Some(name),
        }
    }
}

/// Inputs that can change the selection. Names are already validated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionInput<'a> {
    Click(&'a str),
    Search(&'a str),
    Clear,
}

/// Selection transition table.
pub fn next_selection(current: &Selection, input: SelectionInput<'_>) -> Selection {
    match (current, input) {
        (Selection::Selected(center), SelectionInput::Click(name)) if center == name => {
            Selection::Unselected
        }
        (_, SelectionInput::Click(name) | SelectionInput::Search(name)) => {
            Selection::Selected(name.to_owned())
        }
        (_, SelectionInput::Clear) => Selection::Unselected,
    }
}

#[derive(Debug, Default)]
pub struct InteractionController {
    selection: Selection,
    hovered: Option<String>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// Forgets selection and hover, e.g. when the dataset is replaced.
    pub fn reset(&mut self) {
        self.selection = Selection::Unselected;
        self.hovered = None;
    }

    pub fn dispatch(
        &mut self,
        context: &mut SimulationContext,
        event: InteractionEvent,
    ) -> Result<Vec<HostEvent>> {
        let mut outbound = Vec::new();

        match event {
            InteractionEvent::Hover(name) => {
                if context.model().node_index(&name).is_none() {
                    debug!(name = %name, "hover on an unknown node ignored");
                    return Ok(outbound);
                }
                if self.hovered.as_deref() == Some(name.as_str()) {
                    return Ok(outbound);
                }
                self.hovered = Some(name.clone());
                if self.transient_focus_allowed(context) {
                    context.set_focus(FocusState::Center(name.clone()));
                }
                outbound.push(HostEvent::MouseOver(name));
            }
            InteractionEvent::Unhover => {
                if self.hovered.take().is_none() {
                    return Ok(outbound);
                }
                if self.transient_focus_allowed(context) {
                    context.set_focus(FocusState::None);
                }
                outbound.push(HostEvent::MouseOut);
            }
            InteractionEvent::Click(name) => {
                if context.model().node_index(&name).is_none() {
                    debug!(name = %name, "click on an unknown node ignored");
                    return Ok(outbound);
                }
                outbound.push(HostEvent::Click(name.clone()));
                self.apply(context, SelectionInput::Click(&name), &mut outbound);
            }
            InteractionEvent::Search(query) => match context.find_name(&query) {
                Some(name) => self.apply(context, SelectionInput::Search(&name), &mut outbound),
                None => debug!(query = %query, "search matched no node"),
            },
            InteractionEvent::ClearSearch => {
                self.apply(context, SelectionInput::Clear, &mut outbound);
            }
            InteractionEvent::ToggleClustering => {
                context.toggle_clustering();
            }
            InteractionEvent::Resize { width, height } => {
                context.resize(width, height)?;
            }
            InteractionEvent::DragStart(name) => {
                context.drag_start(&name);
            }
            InteractionEvent::DragMove(point) => context.drag_move(point),
            InteractionEvent::DragEnd => {
                context.drag_end();
            }
        }

        Ok(outbound)
    }

    fn transient_focus_allowed(&self, context: &SimulationContext) -> bool {
        self.selection == Selection::Unselected && !context.is_dragging()
    }

    fn apply(
        &mut self,
        context: &mut SimulationContext,
        input: SelectionInput<'_>,
        outbound: &mut Vec<HostEvent>,
    ) {
        let next = next_selection(&self.selection, input);
        if next == self.selection {
            return;
        }
        self.selection = next;

        let focus = match (&self.selection, &self.hovered) {
            (Selection::Selected(name), _) => FocusState::Center(name.clone()),
            (Selection::Unselected, Some(hovered)) if !context.is_dragging() => {
                FocusState::Center(hovered.clone())
            }
            (Selection::Unselected, _) => FocusState::None,
        };
        context.set_focus(focus);
        debug!(selection = ?self.selection.name(), "selection changed");

        let info = self
            .selection
            .name()
            .and_then(|name| context.person_info(name));
        outbound.push(HostEvent::SelectedPersonChanged(info));
    }
}
