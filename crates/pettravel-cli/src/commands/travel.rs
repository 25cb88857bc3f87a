use anyhow::Result;
use colored::Colorize;
use pettravel_client::models::{CreateUserQueryRequest, QueryFeedbackRequest, RequirementFilter};

use super::Context;
use crate::cli::{OutputFormat, QueriesCommands, RequirementsCommands};
use crate::output::{Column, print_data, print_success};

const COUNTRY_COLUMNS: &[Column] = &[("ID", "id"), ("Code", "code"), ("Name", "name")];

const PET_TYPE_COLUMNS: &[Column] = &[("ID", "id"), ("Name", "name"), ("Species", "species")];

const REQUIREMENT_COLUMNS: &[Column] = &[
    ("ID", "id"),
    ("Country", "country"),
    ("Pet type", "pet_type"),
    ("Description", "description"),
    ("Days before", "validity_period"),
    ("Mandatory", "is_mandatory"),
];

const QUERY_COLUMNS: &[Column] = &[
    ("ID", "id"),
    ("From", "origin_country"),
    ("To", "destination_country"),
    ("Question", "query"),
    ("Rating", "feedback_rating"),
];

pub async fn countries(ctx: &Context) -> Result<()> {
    let countries = ctx.client.countries().await?;
    print_data(&countries, ctx.format, COUNTRY_COLUMNS)
}

pub async fn pet_types(ctx: &Context) -> Result<()> {
    let types = ctx.client.pet_types().await?;
    print_data(&types, ctx.format, PET_TYPE_COLUMNS)
}

pub async fn requirements(ctx: &Context, command: RequirementsCommands) -> Result<()> {
    match command {
        RequirementsCommands::List {
            country,
            pet_type,
            mandatory,
        } => {
            let filter = RequirementFilter {
                country,
                pet_type,
                is_mandatory: mandatory,
            };
            let requirements = ctx.client.requirements(filter).await?;
            print_data(&requirements, ctx.format, REQUIREMENT_COLUMNS)
        }
        RequirementsCommands::Get { id } => {
            let requirement = ctx.client.requirement(id).await?;
            print_data(&requirement, ctx.format, REQUIREMENT_COLUMNS)?;
            if ctx.format == OutputFormat::Table && !requirement.documentation_needed.is_empty() {
                println!("{}", "Documentation needed:".cyan());
                for doc in &requirement.documentation_needed {
                    println!("  - {doc}");
                }
            }
            Ok(())
        }
    }
}

pub async fn queries(ctx: &Context, command: QueriesCommands) -> Result<()> {
    match command {
        QueriesCommands::List => {
            let queries = ctx.client.user_queries().await?;
            print_data(&queries, ctx.format, QUERY_COLUMNS)
        }
        QueriesCommands::Ask {
            from,
            to,
            pet_type,
            question,
            conversation,
        } => {
            let request = CreateUserQueryRequest {
                origin_country: from,
                destination_country: to,
                pet_type,
                query: question,
                conversation_id: conversation,
            };
            let answer = ctx.client.create_user_query(&request).await?;
            if ctx.format == OutputFormat::Table {
                println!("{}", answer.response);
                if let Some(conversation) = &answer.conversation_id {
                    println!(
                        "\n{} {} (query {})",
                        "Conversation:".cyan(),
                        conversation,
                        answer.id
                    );
                }
                return Ok(());
            }
            print_data(&answer, ctx.format, QUERY_COLUMNS)
        }
        QueriesCommands::Feedback {
            id,
            rating,
            comments,
        } => {
            let request = QueryFeedbackRequest {
                feedback_rating: rating,
                feedback_comments: comments,
            };
            ctx.client.update_query_feedback(id, &request).await?;
            print_success(&format!("Thanks! Rated query {id} {rating}/5"));
            Ok(())
        }
    }
}
