use std::time::Duration;

use chrono::{DateTime, Utc};
use prost_types::Timestamp;
use qrmenu_proto::menu_service::menu_service_server::MenuService;
use qrmenu_proto::menu_service::{
    self as pb, menu_data, CreateMenuFromTemplatePayload, CreateMenuPayload, DashboardStats,
    GenerateQrCodePayload, GenerateQrCodeResponse, GetDashboardStatsPayload, GetMenuPayload,
    GetQrCodePayload, GetQrCodeResponse, ListMenuTemplatesResponse, ListMenusResponse,
    ListQrCodesResponse, ListUserMenusPayload, ListUserQrCodesPayload,
};
use tonic::{Request, Response, Status};
use tracing::{error, instrument};
use uuid::Uuid;

use crate::dashboard::stats_for_user;
use crate::menu::{CustomMenu, ImportedMenu, Menu, MenuData, MenuSource, TemplateMenu};
use crate::publication::{PublishError, PublishStage, QrPublisher};
use crate::registry::{MenuRegistry, RegistryError};
use crate::storage::ObjectStorage;
use crate::store::{bounded, MenuStore, QrCodeStore, StoreError};

pub struct MenuServiceImpl<S, O> {
    store: S,
    registry: MenuRegistry<S>,
    publisher: QrPublisher<S, O>,
    step_timeout: Duration,
}

impl<S, O> MenuServiceImpl<S, O>
where
    S: MenuStore + QrCodeStore + Clone + Sync,
    O: ObjectStorage + Sync,
{
    pub fn new(store: S, storage: O, step_timeout: Duration) -> Self {
        Self {
            registry: MenuRegistry::new(store.clone()).with_step_timeout(step_timeout),
            publisher: QrPublisher::new(store.clone(), storage).with_step_timeout(step_timeout),
            store,
            step_timeout,
        }
    }
}

fn timestamp(at: &DateTime<Utc>) -> Option<Timestamp> {
    Some(Timestamp {
        seconds: at.timestamp(),
        nanos: at.timestamp_subsec_nanos() as i32,
    })
}

fn parse_menu_id(menu_id: &str) -> Result<Uuid, Status> {
    menu_id
        .parse::<Uuid>()
        .map_err(|_| Status::invalid_argument("Invalid menu id"))
}

fn require_user_id(user_id: &str) -> Result<(), Status> {
    if user_id.trim().is_empty() {
        Err(Status::invalid_argument("user_id must be set"))
    } else {
        Ok(())
    }
}

fn menu_data_to_proto(data: MenuData) -> pb::MenuData {
    let data = match data {
        MenuData::Template(t) => menu_data::Data::Template(pb::TemplateMenuData {
            name: t.name,
            category: t.category,
            template_id: t.template_id,
        }),
        MenuData::Custom(c) => menu_data::Data::Custom(pb::CustomMenuData { name: c.name }),
        MenuData::Imported(i) => menu_data::Data::Imported(pb::ImportedMenuData {
            name: i.name,
            source: Some(pb::MenuSource {
                r#type: i.source.mime_type,
                url: i.source.url,
                original_name: i.source.original_name,
            }),
        }),
    };
    pb::MenuData { data: Some(data) }
}

fn menu_data_from_proto(data: Option<pb::MenuData>) -> Result<MenuData, Status> {
    let data = data
        .and_then(|d| d.data)
        .ok_or(Status::invalid_argument("menu_data must be set"))?;
    Ok(match data {
        menu_data::Data::Template(t) => MenuData::Template(TemplateMenu {
            name: t.name,
            category: t.category,
            template_id: t.template_id,
        }),
        menu_data::Data::Custom(c) => MenuData::Custom(CustomMenu { name: c.name }),
        menu_data::Data::Imported(i) => {
            let source = i
                .source
                .ok_or(Status::invalid_argument("imported menu requires a source"))?;
            MenuData::Imported(ImportedMenu {
                name: i.name,
                source: MenuSource {
                    mime_type: source.r#type,
                    url: source.url,
                    original_name: source.original_name,
                },
            })
        }
    })
}

fn menu_to_proto(menu: Menu) -> pb::Menu {
    pb::Menu {
        id: menu.id.to_string(),
        user_id: menu.user_id,
        menu_type: pb::MenuType::from(menu.data.menu_type()).into(),
        created_at: timestamp(&menu.created_at),
        updated_at: timestamp(&menu.updated_at),
        qr_code_generated: menu.qr_code_generated,
        menu_data: Some(menu_data_to_proto(menu.data)),
    }
}

fn store_status(e: StoreError) -> Status {
    match e {
        StoreError::NotFound => Status::not_found("Record not found"),
        StoreError::Timeout(_) => Status::deadline_exceeded(e.to_string()),
        e => {
            error!(error = ?e, "store failure");
            Status::internal(e.to_string())
        }
    }
}

fn registry_status(e: RegistryError) -> Status {
    match e {
        RegistryError::InvalidInput(_) | RegistryError::UnknownTemplate(_) => {
            Status::invalid_argument(e.to_string())
        }
        RegistryError::Store(e) => store_status(e),
    }
}

fn publish_status(e: PublishError) -> Status {
    let message = match std::error::Error::source(&e) {
        Some(source) => format!("{}: {}", e, source),
        None => e.to_string(),
    };
    if let Some(StoreError::Timeout(_)) = e.store_error() {
        return Status::deadline_exceeded(message);
    }
    match (e.stage(), &e) {
        (_, PublishError::MenuNotFound(_)) => Status::not_found(message),
        (PublishStage::Validation, _) => Status::invalid_argument(message),
        (PublishStage::Storage, _) => {
            error!(error = ?e, "qr publication failed in storage");
            Status::unavailable(message)
        }
        (PublishStage::Database, _) => {
            error!(error = ?e, "qr publication failed in database");
            Status::internal(message)
        }
    }
}

#[tonic::async_trait]
impl<S, O> MenuService for MenuServiceImpl<S, O>
where
    S: MenuStore + QrCodeStore + Clone + Send + Sync + 'static,
    O: ObjectStorage + Send + Sync + 'static,
{
    #[instrument(skip(self))]
    async fn create_menu(
        &self,
        request: Request<CreateMenuPayload>,
    ) -> Result<Response<pb::Menu>, Status> {
        let payload = request.into_inner();
        require_user_id(&payload.user_id)?;
        let data = menu_data_from_proto(payload.menu_data)?;

        let menu = self
            .registry
            .create_menu(&payload.user_id, data)
            .await
            .map_err(registry_status)?;

        Ok(Response::new(menu_to_proto(menu)))
    }

    #[instrument(skip(self))]
    async fn create_menu_from_template(
        &self,
        request: Request<CreateMenuFromTemplatePayload>,
    ) -> Result<Response<pb::Menu>, Status> {
        let payload = request.into_inner();
        require_user_id(&payload.user_id)?;

        let menu = self
            .registry
            .create_menu_from_template(&payload.user_id, payload.template_id)
            .await
            .map_err(registry_status)?;

        Ok(Response::new(menu_to_proto(menu)))
    }

    async fn list_user_menus(
        &self,
        request: Request<ListUserMenusPayload>,
    ) -> Result<Response<ListMenusResponse>, Status> {
        let payload = request.into_inner();
        require_user_id(&payload.user_id)?;

        let menus = self
            .registry
            .list_menus_for_user(&payload.user_id)
            .await
            .map_err(registry_status)?;

        Ok(Response::new(ListMenusResponse {
            menus: menus.into_iter().map(menu_to_proto).collect(),
        }))
    }

    async fn get_menu(
        &self,
        request: Request<GetMenuPayload>,
    ) -> Result<Response<pb::Menu>, Status> {
        let menu_id = parse_menu_id(&request.into_inner().menu_id)?;

        let menu = self
            .registry
            .get_menu(menu_id)
            .await
            .map_err(registry_status)?
            .ok_or(Status::not_found("Menu not found"))?;

        Ok(Response::new(menu_to_proto(menu)))
    }

    async fn list_menu_templates(
        &self,
        _: Request<()>,
    ) -> Result<Response<ListMenuTemplatesResponse>, Status> {
        Ok(Response::new(ListMenuTemplatesResponse {
            templates: self
                .registry
                .templates()
                .iter()
                .map(|t| pb::MenuTemplate {
                    id: t.id,
                    name: t.name.to_string(),
                    category: t.category.to_string(),
                    image_url: t.image_url.to_string(),
                })
                .collect(),
        }))
    }

    #[instrument(skip(self))]
    async fn generate_qr_code(
        &self,
        request: Request<GenerateQrCodePayload>,
    ) -> Result<Response<GenerateQrCodeResponse>, Status> {
        let payload = request.into_inner();
        let menu_id = parse_menu_id(&payload.menu_id)?;

        let qr_code_url = self
            .publisher
            .generate_qr_code(menu_id, &payload.menu_url)
            .await
            .map_err(publish_status)?;

        Ok(Response::new(GenerateQrCodeResponse { qr_code_url }))
    }

    async fn get_qr_code(
        &self,
        request: Request<GetQrCodePayload>,
    ) -> Result<Response<GetQrCodeResponse>, Status> {
        let menu_id = parse_menu_id(&request.into_inner().menu_id)?;

        let (qr_code_url, status) = self
            .publisher
            .qr_code_with_status(menu_id)
            .await
            .map_err(publish_status)?;

        Ok(Response::new(GetQrCodeResponse {
            qr_code_url,
            publication_status: pb::PublicationStatus::from(status).into(),
        }))
    }

    async fn list_user_qr_codes(
        &self,
        request: Request<ListUserQrCodesPayload>,
    ) -> Result<Response<ListQrCodesResponse>, Status> {
        let payload = request.into_inner();
        require_user_id(&payload.user_id)?;

        let listings = self
            .publisher
            .list_qr_codes_for_user(&payload.user_id)
            .await
            .map_err(publish_status)?;

        Ok(Response::new(ListQrCodesResponse {
            qr_codes: listings
                .into_iter()
                .map(|q| pb::QrCode {
                    menu_id: q.menu_id.to_string(),
                    menu_name: q.menu_name,
                    qr_code_url: q.qr_code_url,
                    scan_count: q.scan_count,
                    created_at: timestamp(&q.created_at),
                })
                .collect(),
        }))
    }

    async fn get_dashboard_stats(
        &self,
        request: Request<GetDashboardStatsPayload>,
    ) -> Result<Response<DashboardStats>, Status> {
        let payload = request.into_inner();
        require_user_id(&payload.user_id)?;

        let stats = bounded(
            self.step_timeout,
            stats_for_user(&self.store, &payload.user_id),
        )
        .await
        .map_err(store_status)?;

        Ok(Response::new(DashboardStats {
            total_menus: stats.total_menus,
            published_menus: stats.published_menus,
            qr_codes: stats.qr_codes,
            total_scans: stats.total_scans,
        }))
    }
}
