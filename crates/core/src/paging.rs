//! Pagination and ordering of query results

use crate::model::Entity;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderField {
    /// Last path segment id
    Id,
    /// Display name
    Name,
    /// Full canonical path
    Path,
    /// A property, compared by its JSON rendering
    Property(String),
}

/// One sort criterion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// What to sort by
    pub field: OrderField,
    /// Ascending when true
    pub ascending: bool,
}

impl Order {
    /// Ascending by `field`
    pub fn asc(field: OrderField) -> Self {
        Order {
            field,
            ascending: true,
        }
    }

    /// Descending by `field`
    pub fn desc(field: OrderField) -> Self {
        Order {
            field,
            ascending: false,
        }
    }

    /// Compare two entities by this criterion
    pub fn compare(&self, a: &Entity, b: &Entity) -> Ordering {
        let ordering = match &self.field {
            OrderField::Id => a.id().cmp(b.id()),
            OrderField::Name => a.name().cmp(&b.name()),
            OrderField::Path => a.path().cmp(b.path()),
            OrderField::Property(key) => {
                let render = |e: &Entity| e.properties().get(key).map(|v| v.to_string());
                render(a).cmp(&render(b))
            }
        };
        if self.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    }
}

/// Which slice of a result set to return
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pager {
    /// Zero-based page number
    pub page: usize,
    /// Page size; `None` returns everything
    pub page_size: Option<usize>,
    /// Sort criteria, most significant first
    pub orders: Vec<Order>,
}

impl Default for Pager {
    fn default() -> Self {
        Pager::unlimited()
    }
}

impl Pager {
    /// Everything, in backend order
    pub fn unlimited() -> Self {
        Pager {
            page: 0,
            page_size: None,
            orders: Vec::new(),
        }
    }

    /// The first element only
    pub fn single() -> Self {
        Pager::of(0, 1)
    }

    /// Page `page` of `page_size` elements
    pub fn of(page: usize, page_size: usize) -> Self {
        Pager {
            page,
            page_size: Some(page_size),
            orders: Vec::new(),
        }
    }

    /// The same ordering over the whole result set
    pub fn unpaged(&self) -> Self {
        Pager {
            page: 0,
            page_size: None,
            orders: self.orders.clone(),
        }
    }

    /// Add a sort criterion
    pub fn ordered_by(mut self, order: Order) -> Self {
        self.orders.push(order);
        self
    }

    /// Index of the first element on this page
    pub fn start(&self) -> usize {
        self.page_size.map(|size| self.page * size).unwrap_or(0)
    }

    /// True if the pager restricts the result set
    pub fn is_limited(&self) -> bool {
        self.page_size.is_some()
    }

    /// Compare two entities by all criteria
    pub fn compare(&self, a: &Entity, b: &Entity) -> Ordering {
        self.orders
            .iter()
            .map(|order| order.compare(a, b))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Slice `items`, already in final order, into this page
    pub fn apply<T>(&self, items: Vec<T>) -> Page<T> {
        let total_size = items.len();
        let items = match self.page_size {
            Some(size) => items.into_iter().skip(self.start()).take(size).collect(),
            None => items,
        };
        Page {
            items,
            pager: self.clone(),
            total_size,
        }
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// The elements on this page
    pub items: Vec<T>,
    /// The pager that produced it
    pub pager: Pager,
    /// Number of elements across all pages
    pub total_size: usize,
}

impl<T> Page<T> {
    /// Number of elements on this page
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True if this page is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Convert every element, keeping paging information
    pub fn try_map<U, E, F>(self, f: F) -> Result<Page<U>, E>
    where
        F: FnMut(T) -> Result<U, E>,
    {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<Result<_, _>>()?,
            pager: self.pager,
            total_size: self.total_size,
        })
    }

    /// True if more elements follow this page
    pub fn has_next(&self) -> bool {
        self.pager.start() + self.items.len() < self.total_size
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Environment;

    fn env(id: &str, name: Option<&str>) -> Entity {
        let mut e = Environment::new(format!("/t;a/e;{}", id).parse().unwrap());
        e.name = name.map(String::from);
        e.into()
    }

    #[test]
    fn test_apply_pages() {
        let page = Pager::of(1, 2).apply((0..5).collect::<Vec<_>>());
        assert_eq!(page.items, vec![2, 3]);
        assert_eq!(page.total_size, 5);
        assert!(page.has_next());
        let last = Pager::of(2, 2).apply((0..5).collect::<Vec<_>>());
        assert_eq!(last.items, vec![4]);
        assert!(!last.has_next());
    }

    #[test]
    fn test_unlimited_returns_all() {
        let page = Pager::unlimited().apply(vec!['a', 'b']);
        assert_eq!(page.len(), 2);
        assert!(!page.has_next());
    }

    #[test]
    fn test_compare_by_criteria() {
        let pager = Pager::unlimited()
            .ordered_by(Order::asc(OrderField::Name))
            .ordered_by(Order::desc(OrderField::Id));
        let a = env("x", Some("alpha"));
        let b = env("y", Some("alpha"));
        let c = env("z", Some("beta"));
        assert_eq!(pager.compare(&a, &c), Ordering::Less);
        assert_eq!(pager.compare(&a, &b), Ordering::Greater);
    }

    #[test]
    fn test_try_map_keeps_totals() {
        let page = Pager::of(0, 1).apply(vec![1, 2, 3]);
        let mapped: Page<String> = page.try_map(|i| Ok::<_, ()>(i.to_string())).unwrap();
        assert_eq!(mapped.items, vec!["1".to_string()]);
        assert_eq!(mapped.total_size, 3);
    }
}
