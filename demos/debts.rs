use std::error::Error;

use grouplist::pipeline::GroupedList;
use grouplist::record::Record;
use grouplist::render::{Element, RenderOptions};

fn main() -> Result<(), Box<dyn Error>> {
    let debtors = [
        ("Остап Бендер", 100),
        ("Игнат Делюгин", 200),
        ("Максим Дергачёв", 200),
        ("Петр Дуров", 300),
        ("Иван Иванов", 300),
        ("Сергей Иванов", 300),
        ("Ольга Ивушина", 400),
    ]
    .into_iter()
    .map(|(name, debt)| Record::new().with("name", name).with("debt", debt))
    .collect::<Vec<_>>();

    let list = GroupedList::new(debtors)
        .normalize(|records| {
            records
                .into_iter()
                .map(|record| {
                    let name = record.text("name").unwrap_or_default();
                    let (first, last) = name.split_once(' ').unwrap_or((name.as_str(), ""));
                    Record::new()
                        .with("first", first)
                        .with("last", last)
                        .with("debt", record.get("debt").cloned().unwrap_or_default())
                })
                .collect()
        })
        .group_by(|_, record| record.get("debt").and_then(|d| d.as_i64()));

    let mut container = Element::new("example2");
    list.render_into(&mut container, &RenderOptions::default())?;
    println!("{}", container.to_html());

    Ok(())
}
