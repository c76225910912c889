//! Directory commands: cashiers and customers.

use clap::Subcommand;
use serde_json::{json, Value};

use akari_core::{CoreError, NewUser, UserType, UserUpdate};
use akari_db::{Database, PosError};

use super::to_json;
use crate::error::CliResult;

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        phone: Option<String>,
        /// vendedor | admin
        #[arg(long = "type", default_value = "vendedor")]
        user_type: UserType,
    },
    Get { id: String },
    List,
    Update {
        id: String,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long = "type")]
        user_type: Option<UserType>,
    },
    Delete { id: String },
}

pub async fn user(db: &Database, command: UserCommand) -> CliResult<Value> {
    let users = db.users();
    match command {
        UserCommand::Register {
            username,
            phone,
            user_type,
        } => to_json(
            users
                .register(&NewUser {
                    username,
                    phone,
                    user_type,
                })
                .await?,
        ),
        UserCommand::Get { id } => {
            let user = users
                .get_by_id(&id)
                .await?
                .ok_or_else(|| PosError::from(CoreError::not_found("User", &id)))?;
            to_json(user)
        }
        UserCommand::List => to_json(users.list().await?),
        UserCommand::Update {
            id,
            username,
            phone,
            user_type,
        } => to_json(
            users
                .update(
                    &id,
                    &UserUpdate {
                        username,
                        phone,
                        user_type,
                    },
                )
                .await?,
        ),
        UserCommand::Delete { id } => {
            users.delete(&id).await?;
            Ok(json!({ "deleted": id }))
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum ClientCommand {
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        contact: Option<String>,
    },
    Get { id: String },
    List,
}

pub async fn client(db: &Database, command: ClientCommand) -> CliResult<Value> {
    let clients = db.clients();
    match command {
        ClientCommand::Create {
            name,
            address,
            contact,
        } => to_json(
            clients
                .create(&name, address.as_deref(), contact.as_deref())
                .await?,
        ),
        ClientCommand::Get { id } => {
            let client = clients
                .get_by_id(&id)
                .await?
                .ok_or_else(|| PosError::from(CoreError::not_found("Client", &id)))?;
            to_json(client)
        }
        ClientCommand::List => to_json(clients.list().await?),
    }
}
