use anyhow::Result;
use colored::Colorize;
use pettravel_client::models::{CreatePetRequest, UpdatePetRequest};

use super::Context;
use crate::cli::{PetFields, PetUpdateFields, PetsCommands};
use crate::output::{Column, print_data, print_success};

const PET_COLUMNS: &[Column] = &[
    ("ID", "id"),
    ("Name", "name"),
    ("Type", "type"),
    ("Breed", "breed"),
    ("Age", "age"),
    ("Weight (kg)", "weight"),
    ("Microchip", "microchip_number"),
];

pub async fn run(ctx: &Context, command: PetsCommands) -> Result<()> {
    match command {
        PetsCommands::List => {
            let pets = ctx.client.pets().await?;
            print_data(&pets, ctx.format, PET_COLUMNS)
        }
        PetsCommands::Get { id } => {
            let pet = ctx.client.pet(id).await?;
            print_data(&pet, ctx.format, PET_COLUMNS)
        }
        PetsCommands::Create(fields) => {
            let pet = ctx.client.create_pet(&create_request(fields)).await?;
            print_success(&format!("Added {} (id {})", pet.name.cyan(), pet.id));
            print_data(&pet, ctx.format, PET_COLUMNS)
        }
        PetsCommands::Update { id, fields } => {
            let pet = ctx.client.update_pet(id, &update_request(fields)).await?;
            print_success(&format!("Updated {}", pet.name.cyan()));
            print_data(&pet, ctx.format, PET_COLUMNS)
        }
        PetsCommands::Delete { id } => {
            ctx.client.delete_pet(id).await?;
            print_success(&format!("Removed pet {id}"));
            Ok(())
        }
    }
}

fn create_request(fields: PetFields) -> CreatePetRequest {
    CreatePetRequest {
        name: fields.name.trim().to_string(),
        kind: fields.kind,
        breed: fields.breed,
        age: fields.age,
        weight: fields.weight,
        microchip_number: fields.microchip,
        vaccination_status: fields.vaccination_status,
    }
}

fn update_request(fields: PetUpdateFields) -> UpdatePetRequest {
    UpdatePetRequest {
        name: fields.name,
        kind: fields.kind,
        breed: fields.breed,
        age: fields.age,
        weight: fields.weight,
        microchip_number: fields.microchip,
        vaccination_status: fields.vaccination_status,
    }
}
