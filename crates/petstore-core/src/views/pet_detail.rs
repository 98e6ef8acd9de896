//! Pet detail/edit view: load, form editing, local validation, save.
//!
//! Validation runs entirely on the form text and never reaches the network.
//! Saving builds a full record from the loaded pet plus the form, sends it
//! with `PUT pet`, and reports when the caller should return to the list.

use super::pet_list::display_message;
use crate::api::PetstoreApi;
use crate::cancel::{CancellationToken, LoadTracker};
use crate::config::UiConfig;
use crate::models::{is_http_url, Category, Pet, PetStatus, Tag};
use crate::{PetstoreError, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use tracing::debug;

const LOAD_FAILED: &str = "Failed to load pet";

/// Editable fields of the pet form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    Name,
    Status,
    Category,
    PhotoUrls,
    Tags,
}

impl FormField {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::Name => "name",
            FormField::Status => "status",
            FormField::Category => "category",
            FormField::PhotoUrls => "photoUrls",
            FormField::Tags => "tags",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-field validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors(BTreeMap<FormField, &'static str>);

impl FormErrors {
    pub fn get(&self, field: FormField) -> Option<&'static str> {
        self.0.get(&field).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, &'static str)> + '_ {
        self.0.iter().map(|(field, message)| (*field, *message))
    }

    fn insert(&mut self, field: FormField, message: &'static str) {
        self.0.insert(field, message);
    }

    fn clear(&mut self, field: FormField) {
        self.0.remove(&field);
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field, message)?;
            first = false;
        }
        Ok(())
    }
}

/// Form text as the user edits it.
///
/// Photo URLs are one per line; tags are comma separated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PetForm {
    pub name: String,
    /// Empty when no status is selected.
    pub status: String,
    pub category: String,
    pub photo_urls: String,
    pub tags: String,
}

impl PetForm {
    /// Populate the form from a loaded record.
    pub fn from_pet(pet: &Pet) -> Self {
        Self {
            name: pet.name.clone().unwrap_or_default(),
            status: pet.status.map(|s| s.as_str().to_string()).unwrap_or_default(),
            category: pet.category_name().unwrap_or_default().to_string(),
            photo_urls: pet.photo_urls.join("\n"),
            tags: pet.tag_names().collect::<Vec<_>>().join(", "),
        }
    }

    pub fn field(&self, field: FormField) -> &str {
        match field {
            FormField::Name => &self.name,
            FormField::Status => &self.status,
            FormField::Category => &self.category,
            FormField::PhotoUrls => &self.photo_urls,
            FormField::Tags => &self.tags,
        }
    }

    fn field_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::Name => &mut self.name,
            FormField::Status => &mut self.status,
            FormField::Category => &mut self.category,
            FormField::PhotoUrls => &mut self.photo_urls,
            FormField::Tags => &mut self.tags,
        }
    }

    /// Non-blank, trimmed photo URL lines.
    pub fn photo_list(&self) -> Vec<String> {
        split_trimmed(&self.photo_urls, '\n')
    }

    /// Non-blank, trimmed tag names.
    pub fn tag_list(&self) -> Vec<String> {
        split_trimmed(&self.tags, ',')
    }

    /// The selected status, if the text names one.
    pub fn selected_status(&self) -> Option<PetStatus> {
        self.status.parse().ok()
    }
}

fn split_trimmed(text: &str, separator: char) -> Vec<String> {
    text.split(separator)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Check the form; every failing field gets its own message.
pub fn validate(form: &PetForm) -> std::result::Result<(), FormErrors> {
    let mut errors = FormErrors::default();

    if form.name.trim().is_empty() {
        errors.insert(FormField::Name, "Name is required.");
    }
    if form.selected_status().is_none() {
        errors.insert(FormField::Status, "Status is required.");
    }
    if form.category.trim().is_empty() {
        errors.insert(FormField::Category, "Category is required.");
    }

    let photos = form.photo_list();
    if photos.is_empty() {
        errors.insert(FormField::PhotoUrls, "At least one photo URL is required.");
    } else if photos.iter().any(|url| !is_http_url(url)) {
        errors.insert(
            FormField::PhotoUrls,
            "Photo URLs must start with http:// or https://",
        );
    }

    if form.tag_list().is_empty() {
        errors.insert(FormField::Tags, "At least one tag is required.");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Merge a validated form into the loaded record.
///
/// The category keeps its id. Tags take the id of the loaded tag at the same
/// position, or `position + 1` when there is none.
pub fn build_update(original: &Pet, form: &PetForm) -> Pet {
    let tags = form
        .tag_list()
        .into_iter()
        .enumerate()
        .map(|(idx, name)| Tag {
            id: original
                .tags
                .get(idx)
                .and_then(|t| t.id)
                .or(Some(idx as i64 + 1)),
            name: Some(name),
        })
        .collect();

    Pet {
        id: original.id,
        name: Some(form.name.trim().to_string()),
        category: Some(Category {
            id: original.category.as_ref().and_then(|c| c.id),
            name: Some(form.category.trim().to_string()),
        }),
        photo_urls: form.photo_list(),
        tags,
        status: form.selected_status(),
    }
}

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    /// Record as returned by the service.
    pub pet: Pet,
    /// Delay before returning to the previous view.
    pub return_after: Duration,
}

/// State behind the detail/edit page of one pet.
pub struct PetDetailView {
    pet_id: i64,
    pet: Option<Pet>,
    form: PetForm,
    errors: FormErrors,
    loading: bool,
    load_error: Option<String>,
    saving: bool,
    loads: LoadTracker,
}

impl PetDetailView {
    pub fn new(pet_id: i64) -> Self {
        Self {
            pet_id,
            pet: None,
            form: PetForm::default(),
            errors: FormErrors::default(),
            loading: false,
            load_error: None,
            saving: false,
            loads: LoadTracker::new(),
        }
    }

    pub fn pet_id(&self) -> i64 {
        self.pet_id
    }

    pub fn pet(&self) -> Option<&Pet> {
        self.pet.as_ref()
    }

    pub fn form(&self) -> &PetForm {
        &self.form
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Edit one field; its previous error goes away.
    pub fn set_field(&mut self, field: FormField, value: impl Into<String>) {
        *self.form.field_mut(field) = value.into();
        self.errors.clear(field);
    }

    /// Start a load, cancelling interest in any earlier one.
    pub fn begin_load(&mut self) -> CancellationToken {
        self.loading = true;
        self.load_error = None;
        self.loads.begin()
    }

    /// Apply a finished load. Returns `false` if the load was superseded.
    pub fn apply_load(&mut self, load: &CancellationToken, result: Result<Pet>) -> bool {
        if load.is_cancelled() || matches!(result, Err(PetstoreError::Cancelled)) {
            debug!("Discarding superseded load of pet {}", self.pet_id);
            return false;
        }
        self.loading = false;
        match result {
            Ok(pet) => {
                self.form = PetForm::from_pet(&pet);
                self.errors = FormErrors::default();
                self.pet = Some(pet);
            }
            Err(e) => self.load_error = Some(display_message(&e, LOAD_FAILED)),
        }
        true
    }

    /// Load this view's pet from `api` and apply it.
    pub async fn load(&mut self, api: &PetstoreApi, token: Option<&str>) -> bool {
        let load = self.begin_load();
        let result = fetch_pet(api, self.pet_id, token, &load).await;
        self.apply_load(&load, result)
    }

    /// Validate and save the form.
    ///
    /// Invalid forms fail with [`PetstoreError::Form`] and no request is made.
    /// Only records that already exist remotely can be saved.
    pub async fn save(&mut self, api: &PetstoreApi, token: Option<&str>) -> Result<SaveOutcome> {
        let Some(original) = self.pet.as_ref() else {
            return Err(PetstoreError::Validation {
                field: "id".to_string(),
                message: "No pet loaded; creating pets is not supported".to_string(),
            });
        };
        if original.id.is_none() {
            return Err(PetstoreError::Validation {
                field: "id".to_string(),
                message: "Pet has no identifier; creating pets is not supported".to_string(),
            });
        }

        if let Err(errors) = validate(&self.form) {
            self.errors = errors.clone();
            return Err(PetstoreError::Form(errors));
        }
        self.errors = FormErrors::default();

        let update = build_update(original, &self.form);
        self.saving = true;
        let result = api.update_pet(&update, token).await;
        self.saving = false;

        let pet = result?;
        self.pet = Some(pet.clone());
        Ok(SaveOutcome {
            pet,
            return_after: UiConfig::SAVE_RETURN_DELAY,
        })
    }
}

/// Fetch one pet and stop if the load was cancelled meanwhile.
pub async fn fetch_pet(
    api: &PetstoreApi,
    id: i64,
    token: Option<&str>,
    cancel: &CancellationToken,
) -> Result<Pet> {
    let pet = api.get_pet(id, token).await;
    cancel.check()?;
    pet
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::test_support::gated_api;
    use serde_json::json;

    fn valid_form() -> PetForm {
        PetForm {
            name: "Fido".into(),
            status: "sold".into(),
            category: "Dogs".into(),
            photo_urls: "http://x/a.png".into(),
            tags: "cute".into(),
        }
    }

    fn loaded_pet() -> Pet {
        Pet {
            id: Some(5),
            name: Some("Fido".into()),
            category: Some(Category {
                id: Some(7),
                name: Some("Dogs".into()),
            }),
            photo_urls: vec!["http://x/a.png".into()],
            tags: vec![Tag {
                id: Some(1),
                name: Some("cute".into()),
            }],
            status: Some(PetStatus::Sold),
        }
    }

    #[test]
    fn test_valid_form_passes() {
        assert!(validate(&valid_form()).is_ok());
    }

    #[test]
    fn test_each_rule_fails_independently() {
        let cases: Vec<(FormField, Box<dyn Fn(&mut PetForm)>, &str)> = vec![
            (FormField::Name, Box::new(|f: &mut PetForm| f.name = "   ".into()), "Name is required."),
            (FormField::Status, Box::new(|f: &mut PetForm| f.status.clear()), "Status is required."),
            (FormField::Category, Box::new(|f: &mut PetForm| f.category.clear()), "Category is required."),
            (
                FormField::PhotoUrls,
                Box::new(|f: &mut PetForm| f.photo_urls = "\n  \n".into()),
                "At least one photo URL is required.",
            ),
            (
                FormField::PhotoUrls,
                Box::new(|f: &mut PetForm| f.photo_urls = "http://x/a.png\nftp://x/b.png".into()),
                "Photo URLs must start with http:// or https://",
            ),
            (FormField::Tags, Box::new(|f: &mut PetForm| f.tags = " , ,".into()), "At least one tag is required."),
        ];

        for (field, breaker, message) in cases {
            let mut form = valid_form();
            breaker(&mut form);
            let errors = validate(&form).unwrap_err();
            assert_eq!(errors.len(), 1, "only {} should fail", field);
            assert_eq!(errors.get(field), Some(message));
        }
    }

    #[test]
    fn test_all_errors_reported_together() {
        let errors = validate(&PetForm::default()).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.to_string().contains("name: Name is required."));
    }

    #[test]
    fn test_form_from_pet() {
        let mut pet = loaded_pet();
        pet.tags.push(Tag {
            id: Some(2),
            name: Some("small".into()),
        });
        pet.photo_urls.push("https://x/b.png".into());

        let form = PetForm::from_pet(&pet);
        assert_eq!(form.status, "sold");
        assert_eq!(form.tags, "cute, small");
        assert_eq!(form.photo_urls, "http://x/a.png\nhttps://x/b.png");
        assert_eq!(form.category, "Dogs");
    }

    #[test]
    fn test_unchanged_form_rebuilds_equivalent_record() {
        let pet = loaded_pet();
        let rebuilt = build_update(&pet, &PetForm::from_pet(&pet));
        assert_eq!(rebuilt, pet);
    }

    #[test]
    fn test_build_update_assigns_tag_ids() {
        let pet = loaded_pet();
        let mut form = PetForm::from_pet(&pet);
        form.tags = "cute, fluffy, loud".into();
        form.name = "  Fido II ".into();

        let update = build_update(&pet, &form);
        let ids: Vec<_> = update.tags.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(update.name.as_deref(), Some("Fido II"));
        assert_eq!(update.category.unwrap().id, Some(7));
    }

    #[test]
    fn test_set_field_clears_its_error() {
        let mut view = PetDetailView::new(5);
        let load = view.begin_load();
        view.apply_load(&load, Ok(loaded_pet()));
        view.set_field(FormField::Name, "");
        view.set_field(FormField::Tags, "");
        view.errors = validate(view.form()).unwrap_err();
        assert_eq!(view.errors().len(), 2);

        view.set_field(FormField::Name, "Rex");
        assert_eq!(view.errors().get(FormField::Name), None);
        assert!(view.errors().get(FormField::Tags).is_some());
    }

    #[test]
    fn test_superseded_load_ignored() {
        let mut view = PetDetailView::new(5);
        let stale = view.begin_load();
        let fresh = view.begin_load();

        assert!(view.apply_load(&fresh, Ok(loaded_pet())));
        let mut other = loaded_pet();
        other.name = Some("Stale".into());
        assert!(!view.apply_load(&stale, Ok(other)));

        assert_eq!(view.form().name, "Fido");
    }

    #[test]
    fn test_load_error_message() {
        let mut view = PetDetailView::new(5);
        let load = view.begin_load();
        view.apply_load(
            &load,
            Err(PetstoreError::Api {
                status: 404,
                message: "Pet not found".into(),
            }),
        );
        assert_eq!(view.load_error(), Some("Pet not found"));
        assert!(view.pet().is_none());
        assert!(!view.is_loading());
    }

    #[tokio::test]
    async fn test_fetch_cancelled_while_request_outstanding() {
        let (api, gate) = gated_api(json!({"id": 5, "name": "Fido", "status": "sold"}));
        let mut view = PetDetailView::new(5);
        let load = view.begin_load();

        let fetch = fetch_pet(&api, 5, None, &load);
        let cancel = async {
            tokio::task::yield_now().await;
            load.cancel();
            gate.notify_one();
        };
        let (result, ()) = tokio::join!(fetch, cancel);

        assert!(matches!(result, Err(PetstoreError::Cancelled)));
        assert!(!view.apply_load(&load, result));
        assert!(view.pet().is_none());
        assert_eq!(view.form(), &PetForm::default());
    }
}
