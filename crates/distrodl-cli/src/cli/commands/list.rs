//! `distrodl list` – distributions in catalog order.

use distrodl_core::catalog::Catalog;

pub fn run_list(catalog: &Catalog) {
    if catalog.is_empty() {
        println!("Catalog is empty.");
        return;
    }
    for name in catalog.distributions() {
        let description = catalog.description(name).unwrap_or("");
        let editions = catalog.editions(name).len();
        println!("{:<20} {:>2} edition(s)  {}", name, editions, description);
    }
    let stats = catalog.stats();
    println!(
        "\n{} distribution(s), {} edition(s)",
        stats.distributions, stats.editions
    );
}
