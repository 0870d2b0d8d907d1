pub fn render_schema() -> String {
	let init = include_str!("../../../sql/init.sql");

	expand_includes(init)
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match include_body(path.trim()) {
				Some(body) => out.push_str(body),
				None => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}

fn include_body(path: &str) -> Option<&'static str> {
	let body = match path {
		"00_extensions.sql" => include_str!("../../../sql/00_extensions.sql"),
		"tables/001_city.sql" => include_str!("../../../sql/tables/001_city.sql"),
		"tables/002_i18n_translation.sql" =>
			include_str!("../../../sql/tables/002_i18n_translation.sql"),
		"tables/003_image_asset.sql" => include_str!("../../../sql/tables/003_image_asset.sql"),
		"tables/004_item.sql" => include_str!("../../../sql/tables/004_item.sql"),
		"tables/005_item_city_text_override.sql" =>
			include_str!("../../../sql/tables/005_item_city_text_override.sql"),
		"tables/006_item_alias.sql" => include_str!("../../../sql/tables/006_item_alias.sql"),
		"tables/007_category.sql" => include_str!("../../../sql/tables/007_category.sql"),
		"tables/008_disposal_method.sql" =>
			include_str!("../../../sql/tables/008_disposal_method.sql"),
		"tables/009_warning.sql" => include_str!("../../../sql/tables/009_warning.sql"),
		"tables/010_item_city_category.sql" =>
			include_str!("../../../sql/tables/010_item_city_category.sql"),
		"tables/011_item_city_disposal.sql" =>
			include_str!("../../../sql/tables/011_item_city_disposal.sql"),
		"tables/012_item_city_warning.sql" =>
			include_str!("../../../sql/tables/012_item_city_warning.sql"),
		"tables/013_prospect.sql" => include_str!("../../../sql/tables/013_prospect.sql"),
		"tables/014_vision_cache.sql" => include_str!("../../../sql/tables/014_vision_cache.sql"),
		"tables/015_scan_event.sql" => include_str!("../../../sql/tables/015_scan_event.sql"),
		_ => return None,
	};

	Some(body)
}
