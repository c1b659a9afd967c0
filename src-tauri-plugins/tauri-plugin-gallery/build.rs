const COMMANDS: &[&str] = &["saveImage", "dispatch"];

fn main() {
  tauri_plugin::Builder::new(COMMANDS).build();
}
