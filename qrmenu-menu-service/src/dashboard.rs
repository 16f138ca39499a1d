use crate::store::{MenuStore, QrCodeStore, StoreError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_menus: i64,
    pub published_menus: i64,
    pub qr_codes: i64,
    pub total_scans: i64,
}

/// Usage numbers for a user's dashboard, computed from the stored rows.
pub async fn stats_for_user<S>(store: &S, user_id: &str) -> Result<DashboardStats, StoreError>
where
    S: MenuStore + QrCodeStore + Sync,
{
    let menus = store.menus_by_user(user_id).await?;
    let qr_codes = store.qr_codes_by_user(user_id).await?;

    Ok(DashboardStats {
        total_menus: menus.len() as i64,
        published_menus: menus.iter().filter(|m| m.qr_code_generated).count() as i64,
        qr_codes: qr_codes.len() as i64,
        total_scans: qr_codes.iter().map(|q| i64::from(q.scan_count)).sum(),
    })
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::menu::{CustomMenu, MenuData, NewMenu, NewQrCode};
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_stats_for_user() {
        let store = MemoryStore::default();
        let mut ids = vec![];
        for name in ["Lunch", "Dinner"] {
            let menu = store
                .insert_menu(NewMenu {
                    id: Uuid::new_v4(),
                    user_id: "u1".to_string(),
                    data: MenuData::Custom(CustomMenu {
                        name: name.to_string(),
                    }),
                })
                .await
                .unwrap();
            ids.push(menu.id);
        }
        store
            .insert_qr_code(NewQrCode {
                id: Uuid::new_v4(),
                menu_id: ids[0],
                qr_code_url: "https://a".to_string(),
            })
            .await
            .unwrap();
        store.set_qr_code_generated(ids[0], true).await.unwrap();

        let stats = stats_for_user(&store, "u1").await.unwrap();

        assert_eq!(
            stats,
            DashboardStats {
                total_menus: 2,
                published_menus: 1,
                qr_codes: 1,
                total_scans: 0,
            }
        );
        assert_eq!(
            stats_for_user(&store, "nobody").await.unwrap(),
            DashboardStats::default()
        );
    }
}
