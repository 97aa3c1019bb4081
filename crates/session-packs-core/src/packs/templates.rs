//! Template catalog.

use tracing::info;

use super::{PackError, PackResult};
use crate::db::Repository;
use crate::models::{NewPackTemplate, PackTemplate, TemplatePatch};

/// Template catalog.
///
/// Deleting a template never touches packs already sold from it; they keep
/// the template name copied at purchase time.
pub struct TemplateCatalog<'a> {
    repo: &'a Repository,
}

impl<'a> TemplateCatalog<'a> {
    /// Create a new template catalog.
    pub fn new(repo: &'a Repository) -> Self {
        Self { repo }
    }

    /// Validate and store a new template.
    pub fn create_template(&self, fields: NewPackTemplate) -> PackResult<PackTemplate> {
        let template = PackTemplate::new(fields);
        template.validate().map_err(PackError::InvalidInput)?;
        self.repo.save(&template)?;

        info!(template_id = %template.id, name = %template.name, "Template created");
        Ok(template)
    }

    /// Get a template by ID.
    pub fn get_template(&self, template_id: &str) -> PackResult<Option<PackTemplate>> {
        Ok(self.repo.find(template_id)?)
    }

    /// All templates, in storage order.
    pub fn list_templates(&self) -> PackResult<Vec<PackTemplate>> {
        Ok(self.repo.list()?)
    }

    /// Case-insensitive search on template name.
    pub fn search_templates(&self, query: &str) -> PackResult<Vec<PackTemplate>> {
        let needle = query.trim().to_lowercase();
        Ok(self
            .list_templates()?
            .into_iter()
            .filter(|t| t.name.to_lowercase().contains(&needle))
            .collect())
    }

    /// Apply a partial update. The merged template must still be valid.
    pub fn update_template(&self, template_id: &str, patch: &TemplatePatch) -> PackResult<PackTemplate> {
        let mut merged: PackTemplate = self
            .repo
            .find(template_id)?
            .ok_or_else(|| PackError::template_not_found(template_id))?;
        patch.apply(&mut merged);
        merged.validate().map_err(PackError::InvalidInput)?;

        let updated = self
            .repo
            .update::<PackTemplate, _>(template_id, |t| patch.apply(t))?
            .ok_or_else(|| PackError::template_not_found(template_id))?;

        info!(template_id, "Template updated");
        Ok(updated)
    }

    /// Delete a template. Returns `false` if it did not exist.
    pub fn delete_template(&self, template_id: &str) -> PackResult<bool> {
        let removed = self.repo.remove::<PackTemplate>(template_id)?;
        if removed {
            info!(template_id, "Template deleted");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{FinancialStatus, PatientPack};
    use crate::packs::PackManager;

    #[test]
    fn test_create_and_list() {
        let repo = Repository::new(MemoryStore::new());
        let catalog = TemplateCatalog::new(&repo);

        let created = catalog
            .create_template(NewPackTemplate::new("Wellness Pack - 5 Sessions", 5, 60))
            .unwrap();

        assert_eq!(catalog.list_templates().unwrap(), vec![created.clone()]);
        assert_eq!(catalog.get_template(&created.id).unwrap(), Some(created));
    }

    #[test]
    fn test_create_rejects_invalid_template() {
        let repo = Repository::new(MemoryStore::new());
        let catalog = TemplateCatalog::new(&repo);

        let err = catalog
            .create_template(NewPackTemplate::new("Broken", 0, 60))
            .unwrap_err();
        assert!(matches!(err, PackError::InvalidInput(_)));
        assert!(catalog.list_templates().unwrap().is_empty());
    }

    #[test]
    fn test_non_finite_price_keeps_catalog_intact() {
        let repo = Repository::new(MemoryStore::new());
        let catalog = TemplateCatalog::new(&repo);
        let physio = catalog
            .create_template(NewPackTemplate::new("Physiotherapy Pack", 10, 90))
            .unwrap();
        let wellness = catalog
            .create_template(NewPackTemplate::new("Wellness Pack", 5, 60))
            .unwrap();

        let mut fields = NewPackTemplate::new("Unpriced Pack", 5, 60);
        fields.total_price = f64::NAN;
        assert!(matches!(
            catalog.create_template(fields),
            Err(PackError::InvalidInput(_))
        ));

        let patch = TemplatePatch {
            session_reference_price: Some(f64::INFINITY),
            ..Default::default()
        };
        assert!(matches!(
            catalog.update_template(&physio.id, &patch),
            Err(PackError::InvalidInput(_))
        ));

        catalog
            .create_template(NewPackTemplate::new("Premium Care", 20, 180))
            .unwrap();
        let names: Vec<String> = catalog
            .list_templates()
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["Physiotherapy Pack", "Wellness Pack", "Premium Care"]);
        assert_eq!(catalog.get_template(&wellness.id).unwrap(), Some(wellness));
    }

    #[test]
    fn test_update_template() {
        let repo = Repository::new(MemoryStore::new());
        let catalog = TemplateCatalog::new(&repo);
        let created = catalog
            .create_template(NewPackTemplate::new("Premium Care", 20, 180))
            .unwrap();

        let patch = TemplatePatch {
            total_price: Some(1400.0),
            ..Default::default()
        };
        let updated = catalog.update_template(&created.id, &patch).unwrap();
        assert_eq!(updated.total_price, 1400.0);
        assert_eq!(updated.total_sessions, 20);

        let bad = TemplatePatch {
            validity_period: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            catalog.update_template(&created.id, &bad),
            Err(PackError::InvalidInput(_))
        ));
        assert_eq!(
            catalog.get_template(&created.id).unwrap().unwrap().validity_period,
            180
        );
    }

    #[test]
    fn test_update_missing_template() {
        let repo = Repository::new(MemoryStore::new());
        let catalog = TemplateCatalog::new(&repo);
        let err = catalog
            .update_template("missing", &TemplatePatch::default())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_delete_does_not_cascade() {
        let repo = Repository::new(MemoryStore::new());
        let catalog = TemplateCatalog::new(&repo);
        let packs = PackManager::new(&repo);
        let template = catalog
            .create_template(NewPackTemplate::new("Physiotherapy Pack", 10, 90))
            .unwrap();
        let pack = packs
            .create_pack("patient-001", "John Smith", &template.id, FinancialStatus::Paid, "")
            .unwrap();

        assert!(catalog.delete_template(&template.id).unwrap());
        assert!(!catalog.delete_template(&template.id).unwrap());

        let kept: PatientPack = packs.get_pack(&pack.id).unwrap().unwrap();
        assert_eq!(kept.pack_template_name, "Physiotherapy Pack");
    }

    #[test]
    fn test_search_templates() {
        let repo = Repository::new(MemoryStore::new());
        let catalog = TemplateCatalog::new(&repo);
        catalog
            .create_template(NewPackTemplate::new("Physiotherapy Pack", 10, 90))
            .unwrap();
        catalog
            .create_template(NewPackTemplate::new("Wellness Pack", 5, 60))
            .unwrap();

        assert_eq!(catalog.search_templates("pack").unwrap().len(), 2);
        assert_eq!(catalog.search_templates("WELL").unwrap().len(), 1);
    }
}
