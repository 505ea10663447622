//! `pubgen kinds` command

use anyhow::Result;

use pubgen::default_languages;

pub fn execute() -> Result<()> {
    for lang in default_languages() {
        println!("[{}]", lang.name());
        for load in lang.loads() {
            println!("load: {} ({})", load.name, load.symbols.join(", "));
        }
        let directives = lang.known_directives();
        if !directives.is_empty() {
            println!("directives: {}", directives.join(", "));
        }

        for kind in lang.kinds() {
            let info = kind.info();
            println!("  {}", kind);
            println!("    match_any:  {}", info.match_any);
            println!("    non_empty:  {}", info.non_empty_attrs.join(", "));
            println!("    mergeable:  {}", info.mergeable_attrs.join(", "));
            println!("    resolve:    {}", info.resolve_attrs.join(", "));
        }
        println!();
    }
    Ok(())
}
