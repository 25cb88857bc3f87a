use super::PetTravelClient;
use crate::ApiResult;
use crate::endpoints::Endpoint;
use crate::models::{CreatePetRequest, Pet, UpdatePetRequest};

impl PetTravelClient {
    pub async fn pets(&self) -> ApiResult<Vec<Pet>> {
        self.query_list(Endpoint::Pets).await
    }

    pub async fn pet(&self, id: u64) -> ApiResult<Pet> {
        self.query(Endpoint::Pet(id)).await
    }

    pub async fn create_pet(&self, request: &CreatePetRequest) -> ApiResult<Pet> {
        self.mutate_json(Endpoint::CreatePet, request).await
    }

    pub async fn update_pet(&self, id: u64, request: &UpdatePetRequest) -> ApiResult<Pet> {
        self.mutate_json(Endpoint::UpdatePet(id), request).await
    }

    pub async fn delete_pet(&self, id: u64) -> ApiResult<()> {
        self.mutate_unit(Endpoint::DeletePet(id)).await
    }
}
