//! 依赖图与实例化计划
//!
//! 边 `A -> B` 表示 A 依赖 B。计划使用 Kahn 拓扑排序生成，
//! 同一步有多个可实例化的组件时按组件键的字典序选择，保证构建结果可复现。

use infrastructure_common::{
    ComponentDescriptor, ComponentKey, CyclicDependencyError, GraphError, MissingDependencyError,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// 依赖图
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGraph {
    /// 组件键到其依赖（按声明顺序）
    edges: BTreeMap<ComponentKey, Vec<ComponentKey>>,
}

impl DependencyGraph {
    /// 由描述符构建依赖图
    ///
    /// 组件键重复时返回 [`GraphError::DuplicateKey`]，
    /// 依赖不在描述符集合中时返回 [`MissingDependencyError`]。
    pub fn build(descriptors: &[ComponentDescriptor]) -> Result<Self, GraphError> {
        let mut edges: BTreeMap<ComponentKey, Vec<ComponentKey>> = BTreeMap::new();
        for descriptor in descriptors {
            let key = descriptor.key();
            if edges
                .insert(key.clone(), descriptor.dependencies().to_vec())
                .is_some()
            {
                return Err(GraphError::DuplicateKey { key: key.clone() });
            }
        }

        for (dependent, dependencies) in &edges {
            if let Some(missing) = dependencies.iter().find(|key| !edges.contains_key(*key)) {
                return Err(MissingDependencyError {
                    dependent: dependent.clone(),
                    missing: missing.clone(),
                }
                .into());
            }
        }

        Ok(Self { edges })
    }

    /// 组件的直接依赖
    pub fn dependencies_of(&self, key: &ComponentKey) -> Option<&[ComponentKey]> {
        self.edges.get(key).map(Vec::as_slice)
    }

    /// 直接依赖指定组件的组件，按键排序
    pub fn dependents_of(&self, key: &ComponentKey) -> Vec<&ComponentKey> {
        self.edges
            .iter()
            .filter(|(_, dependencies)| dependencies.contains(key))
            .map(|(dependent, _)| dependent)
            .collect()
    }

    /// 组件数量
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// 是否没有任何组件
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// 计算实例化计划
    ///
    /// 图中存在环时返回 [`CyclicDependencyError`]。
    pub fn plan(&self) -> Result<InstantiationPlan, GraphError> {
        let mut remaining: BTreeMap<&ComponentKey, usize> = self
            .edges
            .iter()
            .map(|(key, dependencies)| (key, dependencies.len()))
            .collect();
        let mut dependents: BTreeMap<&ComponentKey, Vec<&ComponentKey>> = BTreeMap::new();
        for (key, dependencies) in &self.edges {
            for dependency in dependencies {
                dependents.entry(dependency).or_default().push(key);
            }
        }

        let mut ready: BTreeSet<&ComponentKey> = remaining
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(key, _)| *key)
            .collect();
        let mut order = Vec::with_capacity(self.edges.len());

        while let Some(key) = ready.pop_first() {
            remaining.remove(key);
            order.push(key.clone());

            for dependent in dependents.get(key).into_iter().flatten() {
                if let Some(count) = remaining.get_mut(*dependent) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(*dependent);
                    }
                }
            }
        }

        if !remaining.is_empty() {
            let unresolved: BTreeSet<&ComponentKey> = remaining.keys().copied().collect();
            return Err(self.find_cycle(&unresolved).into());
        }

        debug!("实例化计划: {:?}", order);
        Ok(InstantiationPlan { order })
    }

    /// 在未能排序的组件中找出一个环
    ///
    /// 从最小的键出发，每一步沿第一个未解决的依赖前进，直到重复访问某个键。
    fn find_cycle(&self, unresolved: &BTreeSet<&ComponentKey>) -> CyclicDependencyError {
        let mut path: Vec<&ComponentKey> = Vec::new();
        let mut current = unresolved.first().copied();

        while let Some(key) = current {
            if let Some(start) = path.iter().position(|visited| *visited == key) {
                let mut cycle: Vec<ComponentKey> =
                    path[start..].iter().map(|key| (*key).clone()).collect();
                if let Some(min) = cycle
                    .iter()
                    .enumerate()
                    .min_by(|(_, a), (_, b)| a.cmp(b))
                    .map(|(index, _)| index)
                {
                    cycle.rotate_left(min);
                }
                return CyclicDependencyError { cycle };
            }

            path.push(key);
            current = self
                .edges
                .get(key)
                .and_then(|dependencies| dependencies.iter().find(|dep| unresolved.contains(dep)));
        }

        // 每个未解决的组件都至少有一个未解决的依赖，上面的循环必然返回
        CyclicDependencyError {
            cycle: path.into_iter().cloned().collect(),
        }
    }
}

/// 实例化计划
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstantiationPlan {
    order: Vec<ComponentKey>,
}

impl InstantiationPlan {
    /// 按实例化顺序遍历组件键
    pub fn iter(&self) -> std::slice::Iter<'_, ComponentKey> {
        self.order.iter()
    }

    /// 组件在计划中的位置
    pub fn position(&self, key: &ComponentKey) -> Option<usize> {
        self.order.iter().position(|k| k == key)
    }

    /// 计划中的组件数量
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// 计划是否为空
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// 按实例化顺序排列的组件键
    pub fn keys(&self) -> &[ComponentKey] {
        &self.order
    }
}

impl<'a> IntoIterator for &'a InstantiationPlan {
    type Item = &'a ComponentKey;
    type IntoIter = std::slice::Iter<'a, ComponentKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.iter()
    }
}
