use anyhow::Result;
use colored::Colorize;
use pettravel_client::models::PlanFilter;
use pettravel_client::planning::{DashboardStats, today};
use serde_json::json;

use super::Context;
use crate::cli::OutputFormat;
use crate::output::print_data;

pub async fn show(ctx: &Context) -> Result<()> {
    let (pets, plans) = tokio::try_join!(
        ctx.client.pets(),
        ctx.client.travel_plans(PlanFilter::default())
    )?;
    let stats = DashboardStats::compute(&pets, &plans, today());

    if ctx.format != OutputFormat::Table {
        let next = stats.next_departure.as_ref().map(|n| {
            json!({
                "plan_id": n.plan_id,
                "plan_name": n.plan_name,
                "date": n.date.to_string(),
                "days_left": n.days_left,
            })
        });
        let value = json!({
            "pets": stats.pet_count,
            "active_plans": stats.active_plans,
            "upcoming_departures": stats.upcoming_departures,
            "completed_plans": stats.completed_plans,
            "open_requirements": stats.open_requirements,
            "next_departure": next,
        });
        return print_data(&value, ctx.format, &[]);
    }

    if let Some(user) = ctx.client.store().user() {
        println!("Welcome back, {}!\n", user.display_name().bold());
    }
    println!("{:<22}{}", "Pets".cyan(), stats.pet_count);
    println!("{:<22}{}", "Active plans".cyan(), stats.active_plans);
    println!("{:<22}{}", "Upcoming departures".cyan(), stats.upcoming_departures);
    println!("{:<22}{}", "Completed trips".cyan(), stats.completed_plans);
    println!("{:<22}{}", "Open requirements".cyan(), stats.open_requirements);
    match stats.next_departure {
        Some(next) => println!(
            "\nNext trip: {} on {} ({} day(s) left)",
            next.plan_name.bold(),
            next.date,
            next.days_left
        ),
        None => println!("\nNo upcoming trips. Create one with {}", "pettravel plans create".cyan()),
    }
    Ok(())
}
