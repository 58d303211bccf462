use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Page {
    #[default]
    Home,
    Services,
    HowWeWork,
    ServiceArea,
    Contact,
}

impl Page {
    pub const ALL: [Page; 5] =
        [Self::Home, Self::Services, Self::HowWeWork, Self::ServiceArea, Self::Contact];

    pub fn id(self) -> &'static str {
        match self {
            Self::Home => "page-home",
            Self::Services => "page-services",
            Self::HowWeWork => "page-how-we-work",
            Self::ServiceArea => "page-service-area",
            Self::Contact => "page-contact",
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Page {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|page| page.id() == value.trim())
            .ok_or_else(|| format!("unknown page `{value}`"))
    }
}

/// Exactly one page section is active at a time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SiteNavigator {
    active: Page,
}

impl SiteNavigator {
    pub fn active(&self) -> Page {
        self.active
    }

    pub fn navigate(&mut self, page: Page) {
        self.active = page;
    }

    /// Navigate by section id. Unknown ids leave the active page unchanged.
    pub fn navigate_to(&mut self, page_id: &str) -> bool {
        match page_id.parse::<Page>() {
            Ok(page) => {
                self.navigate(page);
                true
            }
            Err(reason) => {
                debug!(
                    event_name = "site.navigation_ignored",
                    reason = %reason,
                    "navigation ignored"
                );
                false
            }
        }
    }

    pub fn is_visible(&self, page: Page) -> bool {
        self.active == page
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MobileMenu {
    open: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MobileMenuView {
    pub menu_visible: bool,
    pub menu_icon_visible: bool,
    pub close_icon_visible: bool,
}

impl MobileMenu {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn view(&self) -> MobileMenuView {
        MobileMenuView {
            menu_visible: self.open,
            menu_icon_visible: !self.open,
            close_icon_visible: self.open,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MobileMenu, Page, SiteNavigator};

    #[test]
    fn starts_on_home_with_one_active_page() {
        let navigator = SiteNavigator::default();
        let visible: Vec<Page> =
            Page::ALL.into_iter().filter(|page| navigator.is_visible(*page)).collect();
        assert_eq!(visible, vec![Page::Home]);
    }

    #[test]
    fn navigate_to_known_and_unknown_ids() {
        let mut navigator = SiteNavigator::default();
        assert!(navigator.navigate_to("page-how-we-work"));
        assert_eq!(navigator.active(), Page::HowWeWork);

        assert!(!navigator.navigate_to("page-blog"));
        assert_eq!(navigator.active(), Page::HowWeWork);
    }

    #[test]
    fn mobile_menu_icons_follow_open_state() {
        let mut menu = MobileMenu::default();
        let closed = menu.view();
        assert!(!closed.menu_visible && closed.menu_icon_visible && !closed.close_icon_visible);

        menu.toggle();
        let open = menu.view();
        assert!(open.menu_visible && !open.menu_icon_visible && open.close_icon_visible);

        menu.toggle();
        assert!(!menu.is_open());
    }
}
