//! Flow engine: resolve a node, render it, block for one line, decide the
//! next node. One engine owns the screen and session for the whole process,
//! so every handler sees them through `FlowContext` rather than globals.

use crate::errors::PortalError;
use crate::graph::{
    Field, FormData, FormNode, MenuHeader, MenuItem, MenuNode, NavigationGraph, Node, NodeId,
    RecordNode, Target, LOGIN_MENU,
};
use crate::handlers::HandlerTable;
use crate::logging::append_run_log;
use crate::render::{render_screen, CONTINUE_PROMPT};
use crate::runtime::Terminal;
use crate::screen::Screen;
use crate::session::Session;
use crate::store::{PatientStore, UserStore};
use crate::types::FieldKind;
use crate::validation::{clean_input, validate_field};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const INVALID_SELECTION: &str = "Invalid Selection!";
pub const LOGGED_OUT: &str = "You have been logged out.";
pub const FORM_ACKNOWLEDGED: &str = "Form submitted successfully!";

/// Outcome of a single dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Goto(Target),
    /// Nothing was chosen; the same node is shown again.
    Stay,
}

/// Mutable state shared by the engine and every handler.
pub struct FlowContext {
    pub screen: Screen,
    pub session: Session,
    pub terminal: Arc<dyn Terminal>,
    pub users: UserStore,
    pub patients: PatientStore,
}

impl FlowContext {
    pub fn new(
        title: impl Into<String>,
        terminal: Arc<dyn Terminal>,
        users: UserStore,
        patients: PatientStore,
    ) -> Self {
        Self {
            screen: Screen::titled(title),
            session: Session::default(),
            terminal,
            users,
            patients,
        }
    }

    pub fn render(&self) -> Result<(), PortalError> {
        render_screen(self.terminal.as_ref(), Some(&self.screen))
    }

    /// Blocks for one line and cleans it. Closed input ends the flow.
    pub fn read_input(&self) -> Result<String, PortalError> {
        match self.terminal.read_line()? {
            Some(raw) => Ok(clean_input(raw.as_str())),
            None => Err(PortalError::InputClosed),
        }
    }

    /// Message mode render followed by the continue pause. The message stays
    /// on the screen model until the next page replaces it.
    pub fn show_message(&mut self, message: impl Into<String>) -> Result<(), PortalError> {
        self.screen.set_message(message);
        self.render()?;
        self.read_input()?;
        Ok(())
    }

    pub fn show_page(
        &mut self,
        header: impl Into<String>,
        body: impl Into<String>,
    ) -> Result<(), PortalError> {
        self.screen.show_page(header, body, CONTINUE_PROMPT);
        self.render()?;
        self.read_input()?;
        Ok(())
    }

    pub fn logout(&mut self) -> Result<(), PortalError> {
        if let Some(user) = self.session.logout() {
            append_run_log(
                "info",
                "session.logout",
                json!({ "identifier": user.identifier_label() }),
            );
            self.show_message(LOGGED_OUT)?;
        }
        Ok(())
    }
}

/// Menu body: item titles in ascending key order, one per line.
pub fn menu_body<'a>(items: impl Into<Option<&'a BTreeMap<u32, MenuItem>>>) -> String {
    items
        .into()
        .map(|items| {
            items
                .values()
                .map(|item| item.title)
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}

/// Answers collected so far, in field order. Passwords show as `*` runs.
pub fn form_listing(fields: &[Field], data: &FormData) -> String {
    fields
        .iter()
        .filter_map(|field| {
            data.get(field.name).map(|value| match field.kind {
                FieldKind::Password => {
                    format!("{}: {}", field.label, "*".repeat(value.chars().count()))
                }
                FieldKind::Text => format!("{}: {value}", field.label),
            })
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct FlowEngine {
    graph: Arc<NavigationGraph>,
    handlers: HandlerTable,
    entry: NodeId,
    ctx: FlowContext,
}

impl FlowEngine {
    pub fn new(graph: NavigationGraph, handlers: HandlerTable, ctx: FlowContext) -> Self {
        Self {
            graph: Arc::new(graph),
            handlers,
            entry: LOGIN_MENU,
            ctx,
        }
    }

    pub fn entry(&self) -> NodeId {
        self.entry
    }

    pub fn context(&self) -> &FlowContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut FlowContext {
        &mut self.ctx
    }

    pub fn screen(&self) -> &Screen {
        &self.ctx.screen
    }

    pub fn session(&self) -> &Session {
        &self.ctx.session
    }

    /// Runs from the entry menu until input closes.
    pub fn run(&mut self) -> Result<(), PortalError> {
        self.run_from(self.entry)
    }

    pub fn run_from(&mut self, start: &str) -> Result<(), PortalError> {
        let mut current = start.to_string();
        loop {
            let step = match self.dispatch(&current) {
                Ok(Transition::Stay) => Ok(None),
                Ok(Transition::Goto(target)) => self.follow(target).map(Some),
                Err(error) => Err(error),
            };
            match step {
                Ok(Some(next)) => current = next.to_string(),
                Ok(None) => {}
                Err(PortalError::InputClosed) => {
                    append_run_log("info", "flow.input_closed", json!({ "node": current }));
                    return Ok(());
                }
                Err(error) => return Err(error),
            }
        }
    }

    /// Resolves a target to the node id to dispatch next, performing the
    /// logout side effect for `Target::Logout`.
    pub fn follow(&mut self, target: Target) -> Result<NodeId, PortalError> {
        match target {
            Target::Node(id) => Ok(id),
            Target::RoleMenu => Ok(self.ctx.session.role_menu()),
            Target::Logout => {
                self.ctx.logout()?;
                Ok(self.entry)
            }
        }
    }

    /// One resolve, render, read, decide cycle.
    pub fn dispatch(&mut self, id: &str) -> Result<Transition, PortalError> {
        let graph = Arc::clone(&self.graph);
        let Some(node) = graph.resolve(id) else {
            return self.not_found(id);
        };
        append_run_log(
            "debug",
            "flow.dispatch",
            json!({ "node": id, "kind": node.kind() }),
        );
        match node {
            Node::Menu(menu) => self.run_menu(menu),
            Node::Form(form) => self.run_form(form),
            Node::Record(record) => self.run_record(record),
        }
    }

    fn not_found(&mut self, id: &str) -> Result<Transition, PortalError> {
        append_run_log("error", "flow.node_missing", json!({ "node": id }));
        self.ctx
            .show_message(format!("Navigation error: '{id}' was not found!"))?;
        let fallback = self.ctx.session.role_menu();
        if fallback == id {
            return Err(PortalError::InvalidConfig(format!(
                "fallback menu {id} is missing from the navigation graph"
            )));
        }
        Ok(Transition::Goto(Target::RoleMenu))
    }

    fn menu_header(&self, menu: &MenuNode) -> String {
        match (menu.header, self.ctx.session.current_user()) {
            (MenuHeader::Greeting, Some(user)) => format!("Hello, {}!", user.full_name()),
            _ => menu.name.to_string(),
        }
    }

    fn run_menu(&mut self, menu: &MenuNode) -> Result<Transition, PortalError> {
        if menu.resets_session {
            self.ctx.logout()?;
        }

        let header = self.menu_header(menu);
        let prompt = format!("Select an option (1-{})", menu.items.len());
        self.ctx.screen.show_page(header, menu_body(&menu.items), prompt);
        self.ctx.render()?;

        let input = self.ctx.read_input()?;
        let chosen = menu
            .items
            .iter()
            .find(|(key, _)| key.to_string() == input)
            .map(|(_, item)| item);
        match chosen {
            Some(item) => Ok(Transition::Goto(item.action)),
            None => {
                append_run_log(
                    "info",
                    "flow.menu.invalid_selection",
                    json!({
                        "menu": menu.id,
                        "input_len": input.chars().count(),
                        "numeric": !input.is_empty() && input.chars().all(|ch| ch.is_ascii_digit()),
                    }),
                );
                self.ctx.show_message(INVALID_SELECTION)?;
                Ok(Transition::Stay)
            }
        }
    }

    fn run_form(&mut self, form: &FormNode) -> Result<Transition, PortalError> {
        let mut data = FormData::new();
        for field in &form.fields {
            loop {
                self.ctx.screen.show_page(
                    form.name,
                    form_listing(&form.fields, &data),
                    format!("Enter {}", field.label.to_lowercase()),
                );
                self.ctx.render()?;
                let value = self.ctx.read_input()?;
                match validate_field(field, &value, &data) {
                    Ok(()) => {
                        data.insert(field.name.to_string(), value);
                        break;
                    }
                    Err(rejection) => {
                        append_run_log(
                            "info",
                            "flow.form.rejected",
                            json!({ "form": form.id, "field": field.name }),
                        );
                        self.ctx.show_message(rejection.message)?;
                    }
                }
            }
        }

        append_run_log(
            "info",
            "flow.form.submitted",
            json!({
                "form": form.id,
                "fields": data.keys().collect::<Vec<_>>(),
            }),
        );
        let succeeded = match self.handlers.form(form.id) {
            Some(processor) => processor(&mut self.ctx, &data)?,
            None => {
                self.ctx.show_message(FORM_ACKNOWLEDGED)?;
                true
            }
        };
        Ok(Transition::Goto(if succeeded {
            form.next
        } else {
            Target::RoleMenu
        }))
    }

    fn run_record(&mut self, record: &RecordNode) -> Result<Transition, PortalError> {
        match self.handlers.record(record.id) {
            Some(handler) => handler(&mut self.ctx)?,
            None => {
                append_run_log(
                    "warn",
                    "flow.record.unhandled",
                    json!({ "record": record.id }),
                );
                self.ctx
                    .show_message(format!("{} is not implemented yet!", record.name))?;
            }
        }
        Ok(Transition::Goto(Target::RoleMenu))
    }
}
