/// 单个业务域的加载状态
///
/// 每个域独立维护，不再用多个布尔位拼凑 loading / error / data。
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Loadable<T> {
    #[default]
    NotRequested,
    Loading,
    Loaded(T),
    Failed(String),
}

impl<T> Loadable<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Loadable::Loading)
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Loadable::Loaded(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Loadable::Loaded(v) => Some(v),
            _ => None,
        }
    }

    pub fn value_mut(&mut self) -> Option<&mut T> {
        match self {
            Loadable::Loaded(v) => Some(v),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Loadable::Failed(e) => Some(e),
            _ => None,
        }
    }

    /// 发起（重新）加载：已有数据时保持 Loaded，避免刷新期间列表闪空
    pub fn begin(&mut self) {
        if !self.is_loaded() {
            *self = Loadable::Loading;
        }
    }

    /// 写入结果；`merge` 在已有数据时原地合并（保留视图状态），否则直接替换
    pub fn finish<E: ToString>(
        &mut self,
        result: Result<T, E>,
        merge: impl FnOnce(&mut T, T),
    ) {
        match result {
            Ok(fresh) => {
                if let Loadable::Loaded(current) = self {
                    merge(current, fresh);
                } else {
                    *self = Loadable::Loaded(fresh);
                }
            }
            Err(e) => *self = Loadable::Failed(e.to_string()),
        }
    }
}
