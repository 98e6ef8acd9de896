//! Subcommand handlers.

use crate::render;
use crate::Command;
use anyhow::{bail, Context, Result};
use petstore_core::{
    FileStore, FormField, PetDetailView, PetListView, PetstoreError, SessionManager,
    SignupRequest,
};
use std::io::{self, Write};
use std::sync::Arc;
use tracing::info;

pub async fn run(
    command: Command,
    mut session: SessionManager,
    store: Arc<FileStore>,
) -> Result<()> {
    match command {
        Command::Login { username, password } => {
            let password = resolve_password(password)?;
            session.login(&username, &password).await?;
            println!("Logged in as {}", username);
        }
        Command::Signup {
            username,
            password,
            email,
            first_name,
            last_name,
            phone,
        } => {
            let request = SignupRequest {
                username,
                password: resolve_password(password)?,
                email,
                first_name,
                last_name,
                phone,
            };
            session.signup(&request).await?;
            println!("Account created; logged in as {}", request.username);
        }
        Command::Logout => {
            session.logout();
            println!("Logged out");
        }
        Command::Whoami => match session.username() {
            Some(username) => println!("{}", username),
            None => println!("Not logged in"),
        },
        Command::List { status, search } => {
            let token = require_token(&session)?;
            let mut view = PetListView::new(store);
            if let Some(status) = status {
                view.pick_status(status);
            }
            if let Some(search) = search {
                view.set_search(search);
            }
            view.load(session.api(), Some(&token)).await;
            println!("{}", render::pet_list(&view));
        }
        Command::Show { id } => {
            let token = require_token(&session)?;
            let mut view = PetDetailView::new(id);
            view.load(session.api(), Some(&token)).await;
            println!("{}", render::pet_detail(&view));
        }
        Command::Edit {
            id,
            name,
            status,
            category,
            photo_urls,
            tags,
        } => {
            let token = require_token(&session)?;
            let mut view = PetDetailView::new(id);
            view.load(session.api(), Some(&token)).await;
            if let Some(error) = view.load_error() {
                bail!("Could not load pet {}: {}", id, error);
            }

            let changes = [
                (FormField::Name, name),
                (FormField::Status, status),
                (FormField::Category, category),
                (FormField::PhotoUrls, join_non_empty(photo_urls)),
                (FormField::Tags, tags),
            ];
            for (field, value) in changes {
                if let Some(value) = value {
                    view.set_field(field, value);
                }
            }

            match view.save(session.api(), Some(&token)).await {
                Ok(outcome) => {
                    println!("Saved {}", outcome.pet.display_name());
                    tokio::time::sleep(outcome.return_after).await;

                    let mut list = PetListView::new(store);
                    list.load(session.api(), Some(&token)).await;
                    println!("{}", render::pet_list(&list));
                }
                Err(PetstoreError::Form(errors)) => {
                    bail!("Form has errors:\n{}", render::form_errors(&errors));
                }
                Err(e) => return Err(e).context("Failed to save pet"),
            }
        }
    }
    Ok(())
}

fn require_token(session: &SessionManager) -> Result<String> {
    match session.token() {
        Some(token) => {
            info!("Using session for {}", session.username().unwrap_or_default());
            Ok(token.to_string())
        }
        None => bail!("Not logged in; run `petstore-admin login` first"),
    }
}

/// Use the given password, or read one line from stdin.
fn resolve_password(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Failed to read password")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("A password is required");
    }
    Ok(password)
}

fn join_non_empty(values: Vec<String>) -> Option<String> {
    if values.is_empty() {
        None
    } else {
        Some(values.join("\n"))
    }
}
