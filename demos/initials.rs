use std::error::Error;

use grouplist::pipeline::GroupedList;
use grouplist::record::Record;
use grouplist::render::{Element, RenderOptions};
use grouplist::source::{FetchRequest, HttpSettings, HttpTransport};
use grouplist::transform::{Grouper, Normalizer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    grouplist::logging::init(1);

    let people = [
        "Остап Бендер",
        "Игнат Делюгин",
        "Максим Дергачёв",
        "Петр Дуров",
        "Иван Иванов",
        "Сергей Иванов",
        "Ольга Ивушина",
    ]
    .into_iter()
    .map(|name| Record::new().with("name", name))
    .collect::<Vec<_>>();

    let mut list = GroupedList::new(people);

    // Optional remote source; the inline people stay when it fails.
    if let Ok(url) = std::env::var("GROUPLIST_URL") {
        let transport = HttpTransport::new(&HttpSettings::default())?;
        let request = FetchRequest::new(url).field("name").sort("name");
        list = list.fetch(&transport, &request).await;
    }

    let normalizer = Normalizer::SplitName {
        field: "name".to_string(),
    };
    let grouper = Grouper::Initial {
        field: "last".to_string(),
    };
    let list = list
        .normalize(|records| normalizer.apply(records))
        .group_by(|_, record| grouper.key(record));

    let mut container = Element::new("example1");
    list.render_into(&mut container, &RenderOptions::default())?;
    println!("{}", container.to_html());

    Ok(())
}
