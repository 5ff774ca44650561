#![allow(dead_code)]

use serde_json::{json, Value};

pub fn bookstore() -> Value {
    json!({
        "store": {
            "name": "Corner Books",
            "book": [
                {
                    "category": "reference",
                    "author": "Nigel Rees",
                    "title": "Sayings of the Century",
                    "price": 8.95
                },
                {
                    "category": "fiction",
                    "author": "Evelyn Waugh",
                    "title": "Sword of Honour",
                    "price": 12.99
                },
                {
                    "category": "fiction",
                    "author": "Herman Melville",
                    "title": "Moby Dick",
                    "isbn": "0-553-21311-3",
                    "price": 8.99
                },
                {
                    "category": "fiction",
                    "author": "J. R. R. Tolkien",
                    "title": "The Lord of the Rings",
                    "isbn": "0-395-19395-8",
                    "price": 22.99
                }
            ],
            "bicycle": {"color": "red", "price": 19.95}
        }
    })
}

pub fn inventory() -> Value {
    json!({
        "items": [
            {"id": 1, "sku": "a-1", "qty": 4, "tags": ["new"]},
            {"id": 2, "sku": "b-2", "qty": 0, "tags": []},
            {"id": 3, "sku": "c-3", "qty": "12", "tags": ["sale", "new"]},
            {"id": 4, "sku": "d-4", "qty": 7, "tags": ["sale"]},
            {"id": 5, "sku": "e-5", "qty": null, "tags": []}
        ],
        "settings": {"currency": "EUR", "tax": {"rate": 20, "included": true}}
    })
}

pub fn titles(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("title").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

pub fn ids(value: &Value) -> Vec<i64> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("id").and_then(Value::as_i64))
                .collect()
        })
        .unwrap_or_default()
}
