/// File-system friendly rendition of a card file name: spaces become
/// underscores, apostrophes and commas vanish.
pub fn clean_file_name(input: &str) -> String {
    input.replace(' ', "_").replace(['\'', ','], "")
}
