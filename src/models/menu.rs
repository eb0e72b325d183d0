use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubItem {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub path: String,
    #[serde(rename = "subItems", default)]
    pub sub_items: Vec<SubItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuCategory {
    pub name: String,
    pub items: Vec<MenuItem>,
}

/// 某个角色可见的菜单：分类名 -> 有序菜单项
///
/// 序列化成 JSON 对象，键的顺序即分类顺序。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuMap {
    categories: Vec<MenuCategory>,
}

/// `menus` 表的一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MenuRow {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub category: String,
    pub name: String,
    pub path: String,
    pub sort_order: i32,
}

impl MenuMap {
    pub fn new(categories: Vec<MenuCategory>) -> Self {
        Self { categories }
    }

    /// 由授权给某角色的菜单行组装菜单树。
    ///
    /// 只有两层：父级不在结果里的子项会被丢弃，更深的层级同样忽略。
    pub fn from_rows(mut rows: Vec<MenuRow>) -> Self {
        rows.sort_by_key(|row| (row.sort_order, row.id));

        let mut children: HashMap<i64, Vec<SubItem>> = HashMap::new();
        for row in rows.iter().filter(|row| row.parent_id.is_some()) {
            if let Some(parent_id) = row.parent_id {
                children.entry(parent_id).or_default().push(SubItem {
                    name: row.name.clone(),
                    path: row.path.clone(),
                });
            }
        }

        let mut categories: Vec<MenuCategory> = Vec::new();
        for row in rows.into_iter().filter(|row| row.parent_id.is_none()) {
            let item = MenuItem {
                sub_items: children.remove(&row.id).unwrap_or_default(),
                name: row.name,
                path: row.path,
            };
            match categories.iter_mut().find(|c| c.name == row.category) {
                Some(category) => category.items.push(item),
                None => categories.push(MenuCategory {
                    name: row.category,
                    items: vec![item],
                }),
            }
        }

        Self { categories }
    }

    pub fn categories(&self) -> &[MenuCategory] {
        &self.categories
    }

    /// 按出现顺序遍历所有菜单项及子项的路径
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().flat_map(|category| {
            category.items.iter().flat_map(|item| {
                std::iter::once(item.path.as_str()).chain(item.sub_items.iter().map(|sub| sub.path.as_str()))
            })
        })
    }
}

impl Serialize for MenuMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for category in &self.categories {
            map.serialize_entry(&category.name, &category.items)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for MenuMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MenuMapVisitor;

        impl<'de> Visitor<'de> for MenuMapVisitor {
            type Value = MenuMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of category name to menu items")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<MenuMap, A::Error> {
                let mut categories = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, items)) = access.next_entry::<String, Vec<MenuItem>>()? {
                    categories.push(MenuCategory { name, items });
                }
                Ok(MenuMap { categories })
            }
        }

        deserializer.deserialize_map(MenuMapVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, parent_id: Option<i64>, category: &str, name: &str, path: &str, sort_order: i32) -> MenuRow {
        MenuRow {
            id,
            parent_id,
            category: category.into(),
            name: name.into(),
            path: path.into(),
            sort_order,
        }
    }

    #[test]
    fn rows_are_grouped_by_category_in_order() {
        let map = MenuMap::from_rows(vec![
            row(3, None, "Master Data", "Pasar", "/pasar-management", 2),
            row(1, None, "Utama", "Dashboard", "/dashboard", 0),
            row(4, Some(3), "Master Data", "Lapak", "/pasar-management/lapak", 0),
            row(2, None, "Master Data", "Pengguna", "/user-management", 1),
        ]);

        let names: Vec<&str> = map.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Utama", "Master Data"]);

        let master = &map.categories()[1];
        assert_eq!(master.items[0].path, "/user-management");
        assert_eq!(master.items[1].path, "/pasar-management");
        assert_eq!(master.items[1].sub_items[0].path, "/pasar-management/lapak");
    }

    #[test]
    fn orphan_sub_items_are_dropped() {
        let map = MenuMap::from_rows(vec![
            row(1, None, "Utama", "Dashboard", "/dashboard", 0),
            row(9, Some(42), "Utama", "Hilang", "/ghost", 0),
        ]);
        assert_eq!(map.paths().collect::<Vec<_>>(), ["/dashboard"]);
    }

    #[test]
    fn json_keeps_category_order_and_sub_items_key() {
        let map = MenuMap::from_rows(vec![
            row(1, None, "Zeta", "Iuran", "/iuran", 0),
            row(2, None, "Alpha", "Pedagang", "/pedagang", 1),
            row(3, Some(2), "Alpha", "Detail", "/pedagang/detail", 0),
        ]);

        let json = serde_json::to_string(&map).unwrap();
        assert!(json.find("Zeta").unwrap() < json.find("Alpha").unwrap());
        assert!(json.contains("\"subItems\":[{\"name\":\"Detail\",\"path\":\"/pedagang/detail\"}]"));

        let parsed: MenuMap = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, map);
    }

    #[test]
    fn missing_sub_items_default_to_empty() {
        let parsed: MenuMap =
            serde_json::from_str(r#"{"Utama":[{"name":"Dashboard","path":"/dashboard"}]}"#).unwrap();
        assert!(parsed.categories()[0].items[0].sub_items.is_empty());
    }
}
