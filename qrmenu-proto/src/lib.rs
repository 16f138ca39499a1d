pub mod menu_service {
    tonic::include_proto!("qrmenu.menu_service");
}
