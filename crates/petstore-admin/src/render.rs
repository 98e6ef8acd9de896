//! Plain-text rendering of pets and form errors.

use petstore_core::{FormErrors, Pet, PetDetailView, PetListView, PetStatus};

/// One line per pet, as shown on the list cards.
pub fn pet_card(pet: &Pet) -> String {
    let id = pet
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "#{:<8} {:<24} [{}] {}",
        id,
        pet.display_name(),
        PetStatus::label_or_unknown(pet.status),
        pet.cover_image()
    )
}

pub fn pet_list(view: &PetListView) -> String {
    if let Some(error) = view.error() {
        return format!("Error: {}", error);
    }
    if view.is_empty_result() {
        return "No pets found.".to_string();
    }
    view.visible()
        .into_iter()
        .map(pet_card)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn pet_detail(view: &PetDetailView) -> String {
    if let Some(error) = view.load_error() {
        return format!("Error: {}", error);
    }
    let Some(pet) = view.pet() else {
        return "Pet not loaded.".to_string();
    };

    let tags: Vec<&str> = pet.tag_names().collect();
    let mut out = vec![
        format!("Id:       {}", view.pet_id()),
        format!("Name:     {}", pet.display_name()),
        format!("Status:   {}", PetStatus::label_or_unknown(pet.status)),
        format!("Category: {}", pet.category_name().unwrap_or("-")),
        format!("Tags:     {}", tags.join(", ")),
        "Photos:".to_string(),
    ];
    if pet.photo_urls.is_empty() {
        out.push(format!("  {}", pet.cover_image()));
    }
    out.extend(pet.photo_urls.iter().map(|url| format!("  {}", url)));
    out.join("\n")
}

pub fn form_errors(errors: &FormErrors) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("  {}: {}", field.as_str(), message))
        .collect::<Vec<_>>()
        .join("\n")
}
