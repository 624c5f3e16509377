/// Line-oriented output sink for everything the tool reports.
pub trait Console: Send {
    fn line(&mut self, text: &str);
}

/// Writes to the process's standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutConsole;

impl Console for StdoutConsole {
    fn line(&mut self, text: &str) {
        println!("{}", text);
    }
}

/// Collects lines in memory.
impl Console for Vec<String> {
    fn line(&mut self, text: &str) {
        self.push(text.to_string());
    }
}
