/// What a countdown widget can show. Implemented by whatever renders the page.
pub trait WidgetView: Send {
    fn show_count(&mut self, remaining: u32);
    /// Replace the counter with a message.
    fn show_message(&mut self, message: &str);
    fn show_code(&mut self, code: &str);
    fn hide_start_button(&mut self);
    /// Show the "next" button; it stays disabled until `enable_next`.
    fn reveal_next(&mut self);
    fn enable_next(&mut self);
    fn hide_widget(&mut self);
}
