use serde::{Deserialize, Serialize};

pub const DEFAULT_INSTITUTION_NAME: &str = "Department Portal";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionSettings {
    pub logo_url: Option<String>,
    pub institution_name: String,
}

impl Default for InstitutionSettings {
    fn default() -> Self {
        InstitutionSettings {
            logo_url: None,
            institution_name: DEFAULT_INSTITUTION_NAME.to_string(),
        }
    }
}

/// `logoUrl: null` clears the logo; an absent key leaves it alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, deserialize_with = "explicit_null")]
    pub logo_url: Option<Option<String>>,
    #[serde(default)]
    pub institution_name: Option<String>,
}

fn explicit_null<'de, D>(d: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(d).map(Some)
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.logo_url.is_none() && self.institution_name.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&InstitutionSettings)>;

/// Holds the branding settings and calls every listener, in the order they
/// subscribed, after each update.
pub struct SettingsHub {
    current: InstitutionSettings,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl SettingsHub {
    pub fn new(initial: InstitutionSettings) -> Self {
        SettingsHub {
            current: initial,
            listeners: Vec::new(),
            next_id: 1,
        }
    }

    pub fn get(&self) -> &InstitutionSettings {
        &self.current
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&InstitutionSettings) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    #[cfg(test)]
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn update(&mut self, patch: SettingsPatch) -> &InstitutionSettings {
        if let Some(logo) = patch.logo_url {
            self.current.logo_url = logo.filter(|s| !s.trim().is_empty());
        }
        if let Some(name) = patch.institution_name {
            self.current.institution_name = name;
        }
        for (_, listener) in self.listeners.iter_mut() {
            listener(&self.current);
        }
        &self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn rename(name: &str) -> SettingsPatch {
        SettingsPatch {
            institution_name: Some(name.to_string()),
            ..SettingsPatch::default()
        }
    }

    #[test]
    fn listeners_fire_in_registration_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut hub = SettingsHub::new(InstitutionSettings::default());
        for tag in ["first", "second", "third"] {
            let seen = Rc::clone(&seen);
            hub.subscribe(move |s| seen.borrow_mut().push(format!("{}:{}", tag, s.institution_name)));
        }
        hub.update(rename("ACME"));
        assert_eq!(
            *seen.borrow(),
            vec!["first:ACME", "second:ACME", "third:ACME"]
        );
    }

    #[test]
    fn unsubscribed_listener_stops_receiving() {
        let count = Rc::new(RefCell::new(0));
        let mut hub = SettingsHub::new(InstitutionSettings::default());
        let c = Rc::clone(&count);
        let id = hub.subscribe(move |_| *c.borrow_mut() += 1);
        hub.update(rename("A"));
        assert!(hub.unsubscribe(id));
        assert!(!hub.unsubscribe(id));
        hub.update(rename("B"));
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let mut hub = SettingsHub::new(InstitutionSettings {
            logo_url: Some("https://x/logo.png".to_string()),
            institution_name: "X".to_string(),
        });
        let keep: SettingsPatch = serde_json::from_str(r#"{"institutionName":"Y"}"#).expect("patch");
        hub.update(keep);
        assert_eq!(hub.get().logo_url.as_deref(), Some("https://x/logo.png"));

        let clear: SettingsPatch = serde_json::from_str(r#"{"logoUrl":null}"#).expect("patch");
        assert!(!clear.is_empty());
        hub.update(clear);
        assert_eq!(hub.get().logo_url, None);
        assert_eq!(hub.get().institution_name, "Y");
    }
}
