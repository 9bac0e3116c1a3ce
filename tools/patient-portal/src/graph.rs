use crate::errors::PortalError;
use crate::types::FieldKind;
use std::collections::{BTreeMap, HashMap};

pub type NodeId = &'static str;

/// Answers collected by a form, keyed by field name.
pub type FormData = BTreeMap<String, String>;

pub const LOGIN_MENU: NodeId = "LOGIN_MENU";
pub const PATIENT_MENU: NodeId = "PATIENT_MENU";
pub const PROFESSIONAL_MENU: NodeId = "PROFESSIONAL_MENU";
pub const ADMIN_MENU: NodeId = "ADMIN_MENU";

pub const USER_LOGIN_FORM: NodeId = "USER_LOGIN_FORM";
pub const USER_CREATE_FORM: NodeId = "USER_CREATE_FORM";
pub const PROFESSIONAL_CREATE_FORM: NodeId = "PROFESSIONAL_CREATE_FORM";
pub const SEARCH_PATIENT_FORM: NodeId = "SEARCH_PATIENT_FORM";

pub const MY_RECORD: NodeId = "MY_RECORD";
pub const ASSIGNED_PATIENTS: NodeId = "ASSIGNED_PATIENTS";
pub const ALL_PATIENT_RECORDS: NodeId = "ALL_PATIENT_RECORDS";
pub const ALL_USERS: NodeId = "ALL_USERS";

/// Where a menu item or a finished form leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Node(NodeId),
    /// Menu derived from the session's role.
    RoleMenu,
    /// Ends the session and returns to the entry menu.
    Logout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuHeader {
    Name,
    /// "Hello, First Last!" when someone is logged in.
    Greeting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub title: &'static str,
    pub action: Target,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuNode {
    pub id: NodeId,
    pub name: &'static str,
    pub header: MenuHeader,
    /// Entering this menu with a live session logs the user out first.
    pub resets_session: bool,
    pub items: BTreeMap<u32, MenuItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub label: &'static str,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormNode {
    pub id: NodeId,
    pub name: &'static str,
    pub next: Target,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordNode {
    pub id: NodeId,
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Menu(MenuNode),
    Form(FormNode),
    Record(RecordNode),
}

impl Node {
    pub fn id(&self) -> NodeId {
        match self {
            Self::Menu(menu) => menu.id,
            Self::Form(form) => form.id,
            Self::Record(record) => record.id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Menu(_) => "menu",
            Self::Form(_) => "form",
            Self::Record(_) => "record",
        }
    }
}

/// Immutable id-addressed node collection.
#[derive(Debug, Clone, Default)]
pub struct NavigationGraph {
    nodes: HashMap<NodeId, Node>,
}

impl NavigationGraph {
    pub fn from_nodes(nodes: impl IntoIterator<Item = Node>) -> Result<Self, PortalError> {
        let mut map = HashMap::new();
        for node in nodes {
            let id = node.id();
            if map.insert(id, node).is_some() {
                return Err(PortalError::InvalidConfig(format!(
                    "duplicate navigation id {id}"
                )));
            }
        }
        Ok(Self { nodes: map })
    }

    pub fn resolve(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Checks that every target resolves and menu keys run `1..=N`.
    pub fn validate(&self) -> Result<(), PortalError> {
        for node in self.nodes.values() {
            match node {
                Node::Menu(menu) => {
                    for (expected, (key, item)) in (1u32..).zip(&menu.items) {
                        if *key != expected {
                            return Err(PortalError::InvalidConfig(format!(
                                "menu {} has gap at item {expected}",
                                menu.id
                            )));
                        }
                        self.check_target(menu.id, item.action)?;
                    }
                }
                Node::Form(form) => self.check_target(form.id, form.next)?,
                Node::Record(_) => {}
            }
        }
        Ok(())
    }

    /// Validation plus presence of the menus the session can resolve to.
    pub fn validate_standard(&self) -> Result<(), PortalError> {
        self.validate()?;
        for id in [LOGIN_MENU, PATIENT_MENU, PROFESSIONAL_MENU, ADMIN_MENU] {
            match self.resolve(id) {
                Some(Node::Menu(_)) => {}
                _ => {
                    return Err(PortalError::InvalidConfig(format!(
                        "required menu {id} is missing"
                    )))
                }
            }
        }
        Ok(())
    }

    fn check_target(&self, from: NodeId, target: Target) -> Result<(), PortalError> {
        if let Target::Node(id) = target {
            if self.resolve(id).is_none() {
                return Err(PortalError::InvalidConfig(format!(
                    "{from} points at unknown node {id}"
                )));
            }
        }
        Ok(())
    }

    pub fn standard() -> Self {
        Self {
            nodes: standard_nodes()
                .into_iter()
                .map(|node| (node.id(), node))
                .collect(),
        }
    }
}

pub fn menu(
    id: NodeId,
    name: &'static str,
    header: MenuHeader,
    items: &[(&'static str, Target)],
) -> MenuNode {
    MenuNode {
        id,
        name,
        header,
        resets_session: false,
        items: (1u32..)
            .zip(items)
            .map(|(key, (title, action))| {
                (
                    key,
                    MenuItem {
                        title: *title,
                        action: *action,
                    },
                )
            })
            .collect(),
    }
}

pub const fn text_field(name: &'static str, label: &'static str) -> Field {
    Field {
        name,
        kind: FieldKind::Text,
        label,
        required: true,
    }
}

pub const fn password_field(name: &'static str, label: &'static str) -> Field {
    Field {
        name,
        kind: FieldKind::Password,
        label,
        required: true,
    }
}

fn account_fields() -> Vec<Field> {
    vec![
        text_field("firstName", "First Name"),
        text_field("lastName", "Last Name"),
        text_field("email", "Email"),
        password_field("password", "Password"),
        password_field("confirmPassword", "Confirm Password"),
    ]
}

fn standard_nodes() -> Vec<Node> {
    let mut login = menu(
        LOGIN_MENU,
        "Welcome! Please log in or create an account.",
        MenuHeader::Name,
        &[
            ("1. Login (Existing user)", Target::Node(USER_LOGIN_FORM)),
            ("2. Create account (New user)", Target::Node(USER_CREATE_FORM)),
        ],
    );
    login.resets_session = true;

    vec![
        Node::Menu(login),
        Node::Menu(menu(
            PATIENT_MENU,
            "Patient Menu",
            MenuHeader::Greeting,
            &[
                ("1. View my medical record", Target::Node(MY_RECORD)),
                ("2. Logout", Target::Logout),
            ],
        )),
        Node::Menu(menu(
            PROFESSIONAL_MENU,
            "Professional Menu",
            MenuHeader::Greeting,
            &[
                ("1. Search patient by NHI", Target::Node(SEARCH_PATIENT_FORM)),
                ("2. View my assigned patients", Target::Node(ASSIGNED_PATIENTS)),
                ("3. View all patient records", Target::Node(ALL_PATIENT_RECORDS)),
                ("4. Logout", Target::Logout),
            ],
        )),
        Node::Menu(menu(
            ADMIN_MENU,
            "Administrator Menu",
            MenuHeader::Greeting,
            &[
                ("1. Register a professional", Target::Node(PROFESSIONAL_CREATE_FORM)),
                ("2. View all patient records", Target::Node(ALL_PATIENT_RECORDS)),
                ("3. View all users", Target::Node(ALL_USERS)),
                ("4. Logout", Target::Logout),
            ],
        )),
        Node::Form(FormNode {
            id: USER_LOGIN_FORM,
            name: "User Login",
            next: Target::RoleMenu,
            fields: vec![
                text_field("email", "Email"),
                password_field("password", "Password"),
            ],
        }),
        Node::Form(FormNode {
            id: USER_CREATE_FORM,
            name: "Create Account",
            next: Target::RoleMenu,
            fields: account_fields(),
        }),
        Node::Form(FormNode {
            id: PROFESSIONAL_CREATE_FORM,
            name: "Register Professional",
            next: Target::RoleMenu,
            fields: account_fields(),
        }),
        Node::Form(FormNode {
            id: SEARCH_PATIENT_FORM,
            name: "Search Patient",
            next: Target::RoleMenu,
            fields: vec![text_field("nhi", "NHI Number")],
        }),
        Node::Record(RecordNode {
            id: MY_RECORD,
            name: "My Medical Record",
            description: "The logged-in patient's own record",
        }),
        Node::Record(RecordNode {
            id: ASSIGNED_PATIENTS,
            name: "My Patients",
            description: "Patients whose assigned GP is the logged-in professional",
        }),
        Node::Record(RecordNode {
            id: ALL_PATIENT_RECORDS,
            name: "All Patient Records",
            description: "Summary of every patient record",
        }),
        Node::Record(RecordNode {
            id: ALL_USERS,
            name: "All Users",
            description: "Summary of every registered account",
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_graph_is_valid() {
        let graph = NavigationGraph::standard();
        graph.validate_standard().expect("valid");
        assert_eq!(graph.len(), 12);
    }

    #[test]
    fn entry_menu_is_the_only_session_reset() {
        let graph = NavigationGraph::standard();
        for id in [LOGIN_MENU, PATIENT_MENU, PROFESSIONAL_MENU, ADMIN_MENU] {
            let Some(Node::Menu(menu)) = graph.resolve(id) else {
                panic!("{id} should be a menu");
            };
            assert_eq!(menu.resets_session, id == LOGIN_MENU);
        }
    }

    #[test]
    fn unknown_target_fails_validation() {
        let graph = NavigationGraph::from_nodes([Node::Menu(menu(
            "HOME",
            "Home",
            MenuHeader::Name,
            &[("1. Nowhere", Target::Node("MISSING"))],
        ))])
        .expect("graph");
        let err = graph.validate().expect_err("dangling");
        assert!(err.to_string().contains("MISSING"));
    }

    #[test]
    fn menu_key_gap_fails_validation() {
        let mut home = menu("HOME", "Home", MenuHeader::Name, &[("1. Out", Target::Logout)]);
        home.items.insert(
            3,
            MenuItem {
                title: "3. Skip",
                action: Target::Logout,
            },
        );
        let graph = NavigationGraph::from_nodes([Node::Menu(home)]).expect("graph");
        assert!(graph.validate().is_err());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let record = || {
            Node::Record(RecordNode {
                id: "R",
                name: "R",
                description: "",
            })
        };
        assert!(NavigationGraph::from_nodes([record(), record()]).is_err());
    }

    #[test]
    fn custom_graph_without_role_menus_fails_standard_check() {
        let graph = NavigationGraph::from_nodes([Node::Menu(menu(
            LOGIN_MENU,
            "Login",
            MenuHeader::Name,
            &[],
        ))])
        .expect("graph");
        graph.validate().expect("structurally fine");
        assert!(graph.validate_standard().is_err());
    }
}
