use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct County {
    pub name: &'static str,
    pub towns: &'static [&'static str],
}

pub const SERVICE_AREAS: &[County] = &[
    County {
        name: "Greater London",
        towns: &[
            "City of London",
            "Westminster",
            "Kensington & Chelsea",
            "Islington",
            "Southwark",
            "Lambeth",
            "Croydon",
            "Bromley",
            "Richmond",
            "Harrow",
            "Ealing",
            "Hounslow",
            "Sutton",
            "Merton",
        ],
    },
    County {
        name: "Surrey",
        towns: &[
            "Guildford",
            "Woking",
            "Epsom",
            "Reigate",
            "Redhill",
            "Staines-upon-Thames",
            "Farnham",
            "Camberley",
            "Esher",
            "Walton-on-Thames",
        ],
    },
    County {
        name: "Hampshire",
        towns: &[
            "Basingstoke",
            "Farnborough",
            "Aldershot",
            "Fleet",
            "Winchester",
            "Andover",
            "Eastleigh",
        ],
    },
    County {
        name: "Berkshire",
        towns: &["Reading", "Slough", "Bracknell", "Maidenhead", "Wokingham", "Newbury", "Windsor"],
    },
    County {
        name: "Buckinghamshire",
        towns: &["Aylesbury", "High Wycombe", "Amersham", "Gerrards Cross", "Beaconsfield"],
    },
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CountyView {
    pub name: &'static str,
    pub towns: &'static [&'static str],
    pub expanded: bool,
    /// Map shape highlight; tracks the expanded county.
    pub highlighted: bool,
}

/// Accordion over the counties served. At most one county is expanded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServiceAreaDirectory {
    expanded: Option<&'static str>,
}

impl ServiceAreaDirectory {
    pub fn counties(&self) -> &'static [County] {
        SERVICE_AREAS
    }

    pub fn find(name: &str) -> Option<&'static County> {
        SERVICE_AREAS.iter().find(|county| county.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn expanded(&self) -> Option<&'static str> {
        self.expanded
    }

    /// Expand `name`, or collapse it if it is already expanded. Unknown names
    /// are ignored.
    pub fn toggle(&mut self, name: &str) {
        let Some(county) = Self::find(name) else {
            return;
        };
        self.expanded = match self.expanded {
            Some(current) if current == county.name => None,
            _ => Some(county.name),
        };
    }

    pub fn view(&self) -> Vec<CountyView> {
        SERVICE_AREAS
            .iter()
            .map(|county| {
                let expanded = self.expanded == Some(county.name);
                CountyView {
                    name: county.name,
                    towns: county.towns,
                    expanded,
                    highlighted: expanded,
                }
            })
            .collect()
    }
}
