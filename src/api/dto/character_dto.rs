//! 角色 DTO

use serde::{Deserialize, Serialize};

use crate::services::character::NewCharacter;

/// 创建角色请求
#[derive(Debug, Deserialize)]
pub struct CreateCharacterRequest {
    pub name: String,
    pub race: String,
    #[serde(alias = "class")]
    pub character_class: String,
    pub background: String,
}

impl From<CreateCharacterRequest> for NewCharacter {
    fn from(request: CreateCharacterRequest) -> Self {
        NewCharacter {
            name: request.name,
            race: request.race,
            character_class: request.character_class,
            background: request.background,
        }
    }
}

/// 根路径响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiInfoResponse {
    pub message: String,
}
