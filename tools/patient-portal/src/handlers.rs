use crate::errors::PortalError;
use crate::flow::FlowContext;
use crate::graph::{
    FormData, NodeId, ALL_PATIENT_RECORDS, ALL_USERS, ASSIGNED_PATIENTS, MY_RECORD,
    PROFESSIONAL_CREATE_FORM, SEARCH_PATIENT_FORM, USER_CREATE_FORM, USER_LOGIN_FORM,
};
use crate::logging::append_run_log;
use crate::records::{
    format_patient_record, patient_summary_line, user_summary_line, NewUser,
};
use crate::types::Role;
use serde_json::json;
use std::collections::HashMap;

/// Consumes a completed form. `Ok(true)` follows the form's `next` target,
/// `Ok(false)` falls back to the role menu.
pub type FormProcessor = fn(&mut FlowContext, &FormData) -> Result<bool, PortalError>;

pub type RecordHandler = fn(&mut FlowContext) -> Result<(), PortalError>;

#[derive(Clone, Default)]
pub struct HandlerTable {
    forms: HashMap<NodeId, FormProcessor>,
    records: HashMap<NodeId, RecordHandler>,
}

impl HandlerTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn standard() -> Self {
        Self::empty()
            .with_form(USER_LOGIN_FORM, process_login)
            .with_form(USER_CREATE_FORM, process_patient_signup)
            .with_form(PROFESSIONAL_CREATE_FORM, process_professional_signup)
            .with_form(SEARCH_PATIENT_FORM, process_patient_search)
            .with_record(MY_RECORD, show_my_record)
            .with_record(ASSIGNED_PATIENTS, show_assigned_patients)
            .with_record(ALL_PATIENT_RECORDS, show_all_patient_records)
            .with_record(ALL_USERS, show_all_users)
    }

    pub fn with_form(mut self, id: NodeId, processor: FormProcessor) -> Self {
        self.forms.insert(id, processor);
        self
    }

    pub fn with_record(mut self, id: NodeId, handler: RecordHandler) -> Self {
        self.records.insert(id, handler);
        self
    }

    pub fn form(&self, id: &str) -> Option<FormProcessor> {
        self.forms.get(id).copied()
    }

    pub fn record(&self, id: &str) -> Option<RecordHandler> {
        self.records.get(id).copied()
    }
}

fn answer<'a>(data: &'a FormData, name: &str) -> &'a str {
    data.get(name).map(String::as_str).unwrap_or_default()
}

pub fn process_login(ctx: &mut FlowContext, data: &FormData) -> Result<bool, PortalError> {
    let email = answer(data, "email");
    let password = answer(data, "password");
    let user = ctx
        .users
        .find_by_email(email)
        .filter(|user| user.password == password);

    let Some(user) = user else {
        append_run_log("warn", "session.login_failed", json!({}));
        ctx.show_message("Invalid email or password!")?;
        return Ok(false);
    };

    append_run_log(
        "info",
        "session.login",
        json!({
            "role": user.role,
            "identifier": user.identifier_label(),
        }),
    );
    let greeting = format!("Login successful! Welcome, {}!", user.full_name());
    ctx.session.login(user);
    ctx.show_message(greeting)?;
    Ok(true)
}

fn create_account(ctx: &mut FlowContext, data: &FormData, role: Role) -> Result<bool, PortalError> {
    let mut data = data.clone();
    data.remove("confirmPassword");

    let outcome = ctx.users.create(NewUser {
        first_name: answer(&data, "firstName").to_string(),
        last_name: answer(&data, "lastName").to_string(),
        email: answer(&data, "email").to_string(),
        password: answer(&data, "password").to_string(),
        role,
    });
    ctx.show_message(outcome.message)?;
    Ok(outcome.success)
}

pub fn process_patient_signup(ctx: &mut FlowContext, data: &FormData) -> Result<bool, PortalError> {
    create_account(ctx, data, Role::Patient)
}

pub fn process_professional_signup(
    ctx: &mut FlowContext,
    data: &FormData,
) -> Result<bool, PortalError> {
    create_account(ctx, data, Role::Professional)
}

pub fn process_patient_search(ctx: &mut FlowContext, data: &FormData) -> Result<bool, PortalError> {
    let Ok(nhi) = answer(data, "nhi").parse::<u32>() else {
        ctx.show_message("Please enter a valid NHI number!")?;
        return Ok(false);
    };
    let Some(patient) = ctx.patients.find_by_nhi(nhi) else {
        ctx.show_message(format!("No patient found with NHI {nhi}!"))?;
        return Ok(false);
    };
    append_run_log("info", "records.patient_viewed", json!({ "nhi": nhi }));
    ctx.show_page(
        format!("Patient Record: {}", patient.full_name()),
        format_patient_record(&patient),
    )?;
    Ok(true)
}

pub fn show_my_record(ctx: &mut FlowContext) -> Result<(), PortalError> {
    let record = ctx
        .session
        .current_user()
        .and_then(|user| user.nhi)
        .and_then(|nhi| ctx.patients.find_by_nhi(nhi));
    match record {
        Some(patient) => ctx.show_page(
            format!("Medical Record: {}", patient.full_name()),
            format_patient_record(&patient),
        ),
        None => ctx.show_message("No medical record found for your account."),
    }
}

pub fn show_assigned_patients(ctx: &mut FlowContext) -> Result<(), PortalError> {
    let Some(gp_id) = ctx.session.current_user().and_then(|user| user.id) else {
        return ctx.show_message("Only professionals have assigned patients.");
    };
    let lines = ctx
        .patients
        .assigned_to(gp_id)
        .iter()
        .map(patient_summary_line)
        .collect::<Vec<_>>();
    let body = if lines.is_empty() {
        "You have no assigned patients.".to_string()
    } else {
        lines.join("\n")
    };
    ctx.show_page(format!("My Patients ({})", lines.len()), body)
}

pub fn show_all_patient_records(ctx: &mut FlowContext) -> Result<(), PortalError> {
    let lines = ctx
        .patients
        .load_all()
        .iter()
        .map(patient_summary_line)
        .collect::<Vec<_>>();
    let body = if lines.is_empty() {
        "No patient records found.".to_string()
    } else {
        lines.join("\n")
    };
    ctx.show_page(format!("All Patient Records ({})", lines.len()), body)
}

pub fn show_all_users(ctx: &mut FlowContext) -> Result<(), PortalError> {
    let lines = ctx
        .users
        .load_all()
        .iter()
        .map(user_summary_line)
        .collect::<Vec<_>>();
    let body = if lines.is_empty() {
        "No users found.".to_string()
    } else {
        lines.join("\n")
    };
    ctx.show_page(format!("All Users ({})", lines.len()), body)
}
