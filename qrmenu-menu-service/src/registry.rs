use std::time::Duration;

use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::menu::{Menu, MenuData, NewMenu, TemplateMenu, ACCEPTED_IMPORT_TYPES};
use crate::store::{bounded, MenuStore, StoreError};
use crate::templates::{find_template, MenuTemplate, MENU_TEMPLATES};
use crate::DEFAULT_STEP_TIMEOUT;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("invalid menu: {0}")]
    InvalidInput(String),
    #[error("template {0} does not exist")]
    UnknownTemplate(i32),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Creates and lists menus scoped to their owning user.
#[derive(Clone)]
pub struct MenuRegistry<S> {
    store: S,
    step_timeout: Duration,
}

impl<S: MenuStore + Sync> MenuRegistry<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            step_timeout: DEFAULT_STEP_TIMEOUT,
        }
    }

    pub fn with_step_timeout(mut self, step_timeout: Duration) -> Self {
        self.step_timeout = step_timeout;
        self
    }

    pub fn templates(&self) -> &'static [MenuTemplate] {
        MENU_TEMPLATES
    }

    #[instrument(skip(self, data), fields(menu_type = %data.menu_type()))]
    pub async fn create_menu(&self, user_id: &str, data: MenuData) -> Result<Menu, RegistryError> {
        validate(user_id, &data)?;
        let menu = bounded(
            self.step_timeout,
            self.store.insert_menu(NewMenu {
                id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                data,
            }),
        )
        .await?;
        info!(menu_id = %menu.id, "menu created");
        Ok(menu)
    }

    pub async fn create_menu_from_template(
        &self,
        user_id: &str,
        template_id: i32,
    ) -> Result<Menu, RegistryError> {
        let template =
            find_template(template_id).ok_or(RegistryError::UnknownTemplate(template_id))?;
        self.create_menu(
            user_id,
            MenuData::Template(TemplateMenu {
                name: template.name.to_string(),
                category: template.category.to_string(),
                template_id: template.id,
            }),
        )
        .await
    }

    pub async fn list_menus_for_user(&self, user_id: &str) -> Result<Vec<Menu>, RegistryError> {
        Ok(bounded(self.step_timeout, self.store.menus_by_user(user_id)).await?)
    }

    pub async fn get_menu(&self, menu_id: Uuid) -> Result<Option<Menu>, RegistryError> {
        Ok(bounded(self.step_timeout, self.store.menu_by_id(menu_id)).await?)
    }
}

fn validate(user_id: &str, data: &MenuData) -> Result<(), RegistryError> {
    if user_id.trim().is_empty() {
        return Err(RegistryError::InvalidInput("user id is required".to_string()));
    }
    if data.name().trim().is_empty() {
        return Err(RegistryError::InvalidInput("menu name is required".to_string()));
    }
    if let MenuData::Imported(imported) = data {
        if !ACCEPTED_IMPORT_TYPES.contains(&imported.source.mime_type.as_str()) {
            return Err(RegistryError::InvalidInput(format!(
                "unsupported file type {}",
                imported.source.mime_type
            )));
        }
        if imported.source.url.trim().is_empty() {
            return Err(RegistryError::InvalidInput(
                "imported menu source url is required".to_string(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::{CustomMenu, ImportedMenu, MenuSource};
    use crate::models::MenuType;
    use crate::store::MemoryStore;

    fn registry() -> MenuRegistry<MemoryStore> {
        MenuRegistry::new(MemoryStore::default())
    }

    fn dinner() -> MenuData {
        MenuData::Template(TemplateMenu {
            name: "Dinner".to_string(),
            category: "Restaurant".to_string(),
            template_id: 3,
        })
    }

    fn imported(mime_type: &str) -> MenuData {
        MenuData::Imported(ImportedMenu {
            name: "menu.pdf".to_string(),
            source: MenuSource {
                mime_type: mime_type.to_string(),
                url: "https://files.example.com/menu.pdf".to_string(),
                original_name: "menu.pdf".to_string(),
            },
        })
    }

    #[tokio::test]
    async fn test_create_menu_is_listed_unpublished() {
        let registry = registry();

        let menu = registry.create_menu("u1", dinner()).await.unwrap();

        assert!(!menu.qr_code_generated);
        assert_eq!(menu.menu_type(), MenuType::Template);
        let menus = registry.list_menus_for_user("u1").await.unwrap();
        assert_eq!(menus.len(), 1);
        assert_eq!(menus[0].id, menu.id);
        assert!(!menus[0].qr_code_generated);
    }

    #[tokio::test]
    async fn test_list_menus_newest_first() {
        let registry = registry();
        for name in ["Breakfast", "Lunch", "Dinner"] {
            registry
                .create_menu(
                    "u1",
                    MenuData::Custom(CustomMenu {
                        name: name.to_string(),
                    }),
                )
                .await
                .unwrap();
        }

        let menus = registry.list_menus_for_user("u1").await.unwrap();

        assert_eq!(
            menus.iter().map(|m| m.data.name()).collect::<Vec<_>>(),
            vec!["Dinner", "Lunch", "Breakfast"]
        );
        assert!(menus
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));
    }

    #[tokio::test]
    async fn test_list_menus_for_user_without_menus_is_empty() {
        let registry = registry();
        registry.create_menu("u1", dinner()).await.unwrap();

        assert!(registry.list_menus_for_user("u2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_menu_from_template() {
        let registry = registry();

        let menu = registry.create_menu_from_template("u1", 5).await.unwrap();

        match menu.data {
            MenuData::Template(template) => {
                assert_eq!(template.name, "Sushi Bar");
                assert_eq!(template.category, "Japanese");
                assert_eq!(template.template_id, 5);
            }
            other => panic!("unexpected variant {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_create_menu_from_unknown_template() {
        let registry = registry();

        let result = registry.create_menu_from_template("u1", 42).await;

        assert!(matches!(result, Err(RegistryError::UnknownTemplate(42))));
        assert!(registry.list_menus_for_user("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_imported_menu_type_is_checked() {
        let registry = registry();

        assert!(registry
            .create_menu("u1", imported("application/pdf"))
            .await
            .is_ok());
        let result = registry.create_menu("u1", imported("text/html")).await;
        assert!(matches!(result, Err(RegistryError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_blank_user_or_name_is_rejected() {
        let registry = registry();

        assert!(matches!(
            registry.create_menu(" ", dinner()).await,
            Err(RegistryError::InvalidInput(_))
        ));
        assert!(matches!(
            registry
                .create_menu(
                    "u1",
                    MenuData::Custom(CustomMenu {
                        name: "".to_string()
                    })
                )
                .await,
            Err(RegistryError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_get_menu() {
        let registry = registry();
        let menu = registry.create_menu("u1", dinner()).await.unwrap();

        assert_eq!(registry.get_menu(menu.id).await.unwrap(), Some(menu));
        assert_eq!(registry.get_menu(Uuid::new_v4()).await.unwrap(), None);
    }
}
