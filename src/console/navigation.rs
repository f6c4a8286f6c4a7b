use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

const STATE_FILE: &str = "console_state.json";

/// 控制台的各个功能区
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Section {
    #[default]
    Dashboard,
    Users,
    Payments,
    Subscriptions,
    Plans,
    AddOns,
    Tickets,
    Notifications,
    Contacts,
    Emails,
}

impl Section {
    pub const ALL: [Section; 10] = [
        Section::Dashboard,
        Section::Users,
        Section::Payments,
        Section::Subscriptions,
        Section::Plans,
        Section::AddOns,
        Section::Tickets,
        Section::Notifications,
        Section::Contacts,
        Section::Emails,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Section::Dashboard => "概览",
            Section::Users => "用户",
            Section::Payments => "支付",
            Section::Subscriptions => "订阅",
            Section::Plans => "套餐",
            Section::AddOns => "增值包",
            Section::Tickets => "工单",
            Section::Notifications => "通知",
            Section::Contacts => "联系请求",
            Section::Emails => "邮件",
        }
    }

    pub fn fragment(self) -> &'static str {
        match self {
            Section::Dashboard => "#dashboard",
            Section::Users => "#users",
            Section::Payments => "#payments",
            Section::Subscriptions => "#subscriptions",
            Section::Plans => "#plans",
            Section::AddOns => "#add-ons",
            Section::Tickets => "#support",
            Section::Notifications => "#notifications",
            Section::Contacts => "#contact-requests",
            Section::Emails => "#emails",
        }
    }

    /// 兼容带或不带 `#` 的写法
    pub fn from_fragment(fragment: &str) -> Option<Self> {
        let wanted = fragment.trim().trim_start_matches('#');
        Self::ALL
            .into_iter()
            .find(|s| s.fragment().trim_start_matches('#').eq_ignore_ascii_case(wanted))
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// 前进/后退历史
#[derive(Debug, Clone)]
pub struct Navigator {
    history: Vec<Section>,
    index: usize,
}

impl Navigator {
    pub fn new(start: Section) -> Self {
        Self {
            history: vec![start],
            index: 0,
        }
    }

    pub fn current(&self) -> Section {
        self.history[self.index]
    }

    /// 跳转到新区块；会丢弃当前位置之后的前进历史。返回是否发生了跳转
    pub fn go(&mut self, section: Section) -> bool {
        if section == self.current() {
            return false;
        }
        self.history.truncate(self.index + 1);
        self.history.push(section);
        self.index += 1;
        true
    }

    pub fn back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    pub fn forward(&mut self) -> bool {
        if self.index + 1 >= self.history.len() {
            return false;
        }
        self.index += 1;
        true
    }

    pub fn can_back(&self) -> bool {
        self.index > 0
    }

    pub fn can_forward(&self) -> bool {
        self.index + 1 < self.history.len()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedState {
    fragment: String,
}

/// 把当前区块写入数据目录，下次启动时恢复
#[derive(Debug, Clone)]
pub struct NavigationStore {
    path: PathBuf,
}

impl NavigationStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(STATE_FILE),
        }
    }

    pub fn load(&self) -> Option<Section> {
        let data = fs::read_to_string(&self.path).ok()?;
        let state: PersistedState = serde_json::from_str(&data).ok()?;
        Section::from_fragment(&state.fragment)
    }

    pub fn save(&self, section: Section) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let state = PersistedState {
            fragment: section.fragment().to_string(),
        };
        fs::write(&self.path, serde_json::to_string_pretty(&state)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragments_round_trip_for_every_section() {
        for s in Section::ALL {
            assert_eq!(Section::from_fragment(s.fragment()), Some(s));
        }
        assert_eq!(Section::from_fragment("USERS"), Some(Section::Users));
        assert_eq!(Section::from_fragment("#nowhere"), None);
    }

    #[test]
    fn history_behaves_like_a_browser() {
        let mut nav = Navigator::new(Section::Dashboard);
        assert!(nav.go(Section::Users));
        assert!(nav.go(Section::Tickets));
        assert!(!nav.go(Section::Tickets));
        assert!(nav.back());
        assert_eq!(nav.current(), Section::Users);
        assert!(nav.go(Section::Plans));
        assert!(!nav.forward());
        assert!(nav.back());
        assert!(nav.back());
        assert_eq!(nav.current(), Section::Dashboard);
        assert!(!nav.back());
        assert!(nav.forward());
        assert_eq!(nav.current(), Section::Users);
    }

    #[test]
    fn section_is_persisted_in_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = NavigationStore::new(dir.path());
        assert_eq!(store.load(), None);
        store.save(Section::Contacts).unwrap();
        assert_eq!(store.load(), Some(Section::Contacts));
    }

    #[test]
    fn section_cycling_wraps() {
        assert_eq!(Section::Emails.next(), Section::Dashboard);
        assert_eq!(Section::Dashboard.prev(), Section::Emails);
    }
}
