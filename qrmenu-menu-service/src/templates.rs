#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MenuTemplate {
    pub id: i32,
    pub name: &'static str,
    pub category: &'static str,
    pub image_url: &'static str,
}

pub const MENU_TEMPLATES: &[MenuTemplate] = &[
    MenuTemplate {
        id: 1,
        name: "Modern Bistro",
        category: "Restaurant",
        image_url: "https://i.pinimg.com/736x/4b/75/2e/4b752e4e653430c8d8338cc4296fc8d3.jpg",
    },
    MenuTemplate {
        id: 2,
        name: "Cafe Classic",
        category: "Cafe",
        image_url: "https://i.pinimg.com/736x/97/ed/27/97ed275cb88d02e3503befe17989ae74.jpg",
    },
    MenuTemplate {
        id: 3,
        name: "Fine Dining",
        category: "Restaurant",
        image_url: "https://i.pinimg.com/736x/98/7e/d9/987ed92fea3a5b637e957468353feff7.jpg",
    },
    MenuTemplate {
        id: 4,
        name: "Pizza & Pasta",
        category: "Italian",
        image_url: "https://i.pinimg.com/736x/ec/13/39/ec1339af7087678f6ddf653be3edd880.jpg",
    },
    MenuTemplate {
        id: 5,
        name: "Sushi Bar",
        category: "Japanese",
        image_url: "https://i.pinimg.com/736x/d1/e6/16/d1e616c65ec9c406ebe5242d918473a6.jpg",
    },
    MenuTemplate {
        id: 6,
        name: "Pub Menu",
        category: "Bar",
        image_url: "https://i.pinimg.com/736x/17/4f/7c/174f7cfbd529717fef637dd3052342ba.jpg",
    },
];

pub fn find_template(id: i32) -> Option<&'static MenuTemplate> {
    MENU_TEMPLATES.iter().find(|t| t.id == id)
}
