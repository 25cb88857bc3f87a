use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};
use colored::Colorize;
use pettravel_client::models::{
    CreateTravelPlanRequest, PlanFilter, PlanRequirement, ProofUpload, RequirementFilter,
    UpdatePlanRequirementRequest, UpdateTravelPlanRequest,
};
use pettravel_client::planning::{
    RequirementUrgency, days_until_departure, requirement_due_date, today, validate_travel_dates,
};
use serde_json::{Value, json};
use time::Date;

use super::{Context, check};
use crate::cli::{OutputFormat, PlanFields, PlanUpdateFields, PlansCommands};
use crate::output::{Column, print_data, print_success};

const PLAN_COLUMNS: &[Column] = &[
    ("ID", "id"),
    ("Name", "name"),
    ("Pet", "pet_name"),
    ("From", "origin_country_name"),
    ("To", "destination_country_name"),
    ("Departure", "departure_date"),
    ("Return", "return_date"),
    ("Status", "status"),
];

const REQUIREMENT_COLUMNS: &[Column] = &[
    ("Req", "requirement_id"),
    ("Description", "description"),
    ("Status", "status"),
    ("Due", "due_date"),
    ("Urgency", "urgency"),
    ("Proof", "has_proof"),
];

pub async fn run(ctx: &Context, command: PlansCommands) -> Result<()> {
    match command {
        PlansCommands::List { status, upcoming } => {
            let filter = PlanFilter {
                status,
                upcoming: upcoming.then_some(true),
            };
            let plans = ctx.client.travel_plans(filter).await?;
            print_data(&plans, ctx.format, PLAN_COLUMNS)
        }
        PlansCommands::Get { id } => {
            let plan = ctx.client.travel_plan(id).await?;
            print_data(&plan, ctx.format, PLAN_COLUMNS)?;
            if ctx.format == OutputFormat::Table {
                let days = days_until_departure(plan.departure_date, today());
                if days >= 0 {
                    println!("{} {days} day(s)", "Departure in".cyan());
                }
            }
            Ok(())
        }
        PlansCommands::Create(fields) => create(ctx, fields).await,
        PlansCommands::Update { id, fields } => {
            let plan = ctx
                .client
                .update_travel_plan(id, &update_request(fields))
                .await?;
            print_success(&format!("Updated plan {}", plan.name.cyan()));
            print_data(&plan, ctx.format, PLAN_COLUMNS)
        }
        PlansCommands::Delete { id } => {
            ctx.client.delete_travel_plan(id).await?;
            print_success(&format!("Deleted plan {id}"));
            Ok(())
        }
        PlansCommands::Requirements { id } => requirements(ctx, id).await,
        PlansCommands::UpdateRequirement {
            plan_id,
            requirement_id,
            status,
            notes,
            completed_on,
        } => {
            let request = UpdatePlanRequirementRequest {
                requirement_id,
                status,
                notes,
                completion_date: completed_on,
            };
            let updated = ctx
                .client
                .update_plan_requirement(plan_id, &request)
                .await?;
            print_success(&format!(
                "Requirement {requirement_id} is now {}",
                updated.status.as_str().cyan()
            ));
            Ok(())
        }
        PlansCommands::UploadProof {
            plan_id,
            requirement_id,
            file,
            content_type,
        } => {
            let bytes =
                fs::read(&file).with_context(|| format!("Failed to read {}", file.display()))?;
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("proof")
                .to_string();
            let upload = ProofUpload {
                requirement_id,
                content_type: content_type.unwrap_or_else(|| guess_content_type(&file).to_string()),
                file_name,
                bytes,
            };
            ctx.client.upload_requirement_proof(plan_id, upload).await?;
            print_success(&format!(
                "Uploaded proof for requirement {requirement_id} of plan {plan_id}"
            ));
            Ok(())
        }
    }
}

async fn create(ctx: &Context, fields: PlanFields) -> Result<()> {
    check(validate_travel_dates(fields.departure, fields.return_date, today()))?;
    let request = CreateTravelPlanRequest {
        name: fields.name.trim().to_string(),
        pet: fields.pet,
        origin_country: fields.from,
        destination_country: fields.to,
        departure_date: fields.departure,
        return_date: fields.return_date,
        notes: fields.notes,
    };
    let plan = ctx.client.create_travel_plan(&request).await?;
    print_success(&format!("Created plan {} (id {})", plan.name.cyan(), plan.id));
    print_data(&plan, ctx.format, PLAN_COLUMNS)
}

fn update_request(fields: PlanUpdateFields) -> UpdateTravelPlanRequest {
    UpdateTravelPlanRequest {
        name: fields.name,
        pet: fields.pet,
        origin_country: fields.from,
        destination_country: fields.to,
        departure_date: fields.departure,
        return_date: fields.return_date,
        status: fields.status,
        notes: fields.notes,
    }
}

async fn requirements(ctx: &Context, plan_id: u64) -> Result<()> {
    let items = ctx.client.plan_requirements(plan_id).await?;
    if ctx.format != OutputFormat::Table {
        return print_data(&items, ctx.format, REQUIREMENT_COLUMNS);
    }

    // Due dates come from the catalogue's validity windows.
    let plan = ctx.client.travel_plan(plan_id).await?;
    let catalogue = ctx
        .client
        .requirements(RequirementFilter {
            country: Some(plan.destination_country),
            ..Default::default()
        })
        .await?;
    let windows: HashMap<u64, u32> = catalogue
        .iter()
        .map(|r| (r.id, r.validity_period))
        .collect();

    let today = today();
    let rows: Vec<Value> = items
        .iter()
        .map(|item| {
            let due = windows
                .get(&item.requirement_id)
                .and_then(|days| requirement_due_date(plan.departure_date, *days));
            requirement_row(item, due, today)
        })
        .collect();
    print_data(&rows, ctx.format, REQUIREMENT_COLUMNS)
}

fn requirement_row(item: &PlanRequirement, due: Option<Date>, today: Date) -> Value {
    json!({
        "requirement_id": item.requirement_id,
        "description": item.description,
        "status": item.status.as_str(),
        "due_date": due.map(|d| d.to_string()),
        "urgency": RequirementUrgency::of(item, due, today).as_str(),
        "has_proof": if item.has_proof { "yes" } else { "no" },
    })
}

fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}
