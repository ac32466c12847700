use serde::{Deserialize, Serialize};

/// Canonical role vocabulary. Every platform role maps into exactly one of
/// these tags before the tree leaves the adapter layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Alert,
    AlertDialog,
    Application,
    Banner,
    Blockquote,
    Button,
    Caption,
    Cell,
    Checkbox,
    Code,
    ColumnHeader,
    Combobox,
    Complementary,
    ContentInfo,
    Deletion,
    Dialog,
    Document,
    Emphasis,
    Figure,
    Form,
    Generic,
    Grid,
    Group,
    Heading,
    Img,
    Insertion,
    Link,
    List,
    ListItem,
    Log,
    Main,
    Marquee,
    Math,
    Menu,
    MenuBar,
    MenuItem,
    MenuItemCheckbox,
    MenuItemRadio,
    Navigation,
    None,
    Note,
    Option,
    Paragraph,
    ProgressBar,
    Radio,
    Region,
    Row,
    RowHeader,
    Scrollbar,
    Search,
    SearchBox,
    Separator,
    Slider,
    SpinButton,
    Status,
    Strong,
    Subscript,
    Superscript,
    Switch,
    Tab,
    Table,
    TabList,
    TabPanel,
    Text,
    Textbox,
    Timer,
    TitleBar,
    Toolbar,
    Tooltip,
    Tree,
    TreeItem,
    Window,
}

impl Role {
    pub const ALL: [Role; 72] = [
        Role::Alert,
        Role::AlertDialog,
        Role::Application,
        Role::Banner,
        Role::Blockquote,
        Role::Button,
        Role::Caption,
        Role::Cell,
        Role::Checkbox,
        Role::Code,
        Role::ColumnHeader,
        Role::Combobox,
        Role::Complementary,
        Role::ContentInfo,
        Role::Deletion,
        Role::Dialog,
        Role::Document,
        Role::Emphasis,
        Role::Figure,
        Role::Form,
        Role::Generic,
        Role::Grid,
        Role::Group,
        Role::Heading,
        Role::Img,
        Role::Insertion,
        Role::Link,
        Role::List,
        Role::ListItem,
        Role::Log,
        Role::Main,
        Role::Marquee,
        Role::Math,
        Role::Menu,
        Role::MenuBar,
        Role::MenuItem,
        Role::MenuItemCheckbox,
        Role::MenuItemRadio,
        Role::Navigation,
        Role::None,
        Role::Note,
        Role::Option,
        Role::Paragraph,
        Role::ProgressBar,
        Role::Radio,
        Role::Region,
        Role::Row,
        Role::RowHeader,
        Role::Scrollbar,
        Role::Search,
        Role::SearchBox,
        Role::Separator,
        Role::Slider,
        Role::SpinButton,
        Role::Status,
        Role::Strong,
        Role::Subscript,
        Role::Superscript,
        Role::Switch,
        Role::Tab,
        Role::Table,
        Role::TabList,
        Role::TabPanel,
        Role::Text,
        Role::Textbox,
        Role::Timer,
        Role::TitleBar,
        Role::Toolbar,
        Role::Tooltip,
        Role::Tree,
        Role::TreeItem,
        Role::Window,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Alert => "alert",
            Role::AlertDialog => "alertdialog",
            Role::Application => "application",
            Role::Banner => "banner",
            Role::Blockquote => "blockquote",
            Role::Button => "button",
            Role::Caption => "caption",
            Role::Cell => "cell",
            Role::Checkbox => "checkbox",
            Role::Code => "code",
            Role::ColumnHeader => "columnheader",
            Role::Combobox => "combobox",
            Role::Complementary => "complementary",
            Role::ContentInfo => "contentinfo",
            Role::Deletion => "deletion",
            Role::Dialog => "dialog",
            Role::Document => "document",
            Role::Emphasis => "emphasis",
            Role::Figure => "figure",
            Role::Form => "form",
            Role::Generic => "generic",
            Role::Grid => "grid",
            Role::Group => "group",
            Role::Heading => "heading",
            Role::Img => "img",
            Role::Insertion => "insertion",
            Role::Link => "link",
            Role::List => "list",
            Role::ListItem => "listitem",
            Role::Log => "log",
            Role::Main => "main",
            Role::Marquee => "marquee",
            Role::Math => "math",
            Role::Menu => "menu",
            Role::MenuBar => "menubar",
            Role::MenuItem => "menuitem",
            Role::MenuItemCheckbox => "menuitemcheckbox",
            Role::MenuItemRadio => "menuitemradio",
            Role::Navigation => "navigation",
            Role::None => "none",
            Role::Note => "note",
            Role::Option => "option",
            Role::Paragraph => "paragraph",
            Role::ProgressBar => "progressbar",
            Role::Radio => "radio",
            Role::Region => "region",
            Role::Row => "row",
            Role::RowHeader => "rowheader",
            Role::Scrollbar => "scrollbar",
            Role::Search => "search",
            Role::SearchBox => "searchbox",
            Role::Separator => "separator",
            Role::Slider => "slider",
            Role::SpinButton => "spinbutton",
            Role::Status => "status",
            Role::Strong => "strong",
            Role::Subscript => "subscript",
            Role::Superscript => "superscript",
            Role::Switch => "switch",
            Role::Tab => "tab",
            Role::Table => "table",
            Role::TabList => "tablist",
            Role::TabPanel => "tabpanel",
            Role::Text => "text",
            Role::Textbox => "textbox",
            Role::Timer => "timer",
            Role::TitleBar => "titlebar",
            Role::Toolbar => "toolbar",
            Role::Tooltip => "tooltip",
            Role::Tree => "tree",
            Role::TreeItem => "treeitem",
            Role::Window => "window",
        }
    }

    /// Parse a canonical role tag. Returns `None` for anything outside the
    /// fixed vocabulary.
    pub fn parse(s: &str) -> Option<Role> {
        Role::ALL.iter().copied().find(|r| r.as_str() == s)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Generic
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical state tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    Busy,
    Checked,
    Collapsed,
    Disabled,
    Editable,
    Expanded,
    Focused,
    Hidden,
    Mixed,
    Modal,
    Multiselectable,
    Offscreen,
    Pressed,
    Readonly,
    Required,
    Selected,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Busy => "busy",
            State::Checked => "checked",
            State::Collapsed => "collapsed",
            State::Disabled => "disabled",
            State::Editable => "editable",
            State::Expanded => "expanded",
            State::Focused => "focused",
            State::Hidden => "hidden",
            State::Mixed => "mixed",
            State::Modal => "modal",
            State::Multiselectable => "multiselectable",
            State::Offscreen => "offscreen",
            State::Pressed => "pressed",
            State::Readonly => "readonly",
            State::Required => "required",
            State::Selected => "selected",
        }
    }

    pub fn parse(s: &str) -> Option<State> {
        const ALL: [State; 16] = [
            State::Busy,
            State::Checked,
            State::Collapsed,
            State::Disabled,
            State::Editable,
            State::Expanded,
            State::Focused,
            State::Hidden,
            State::Mixed,
            State::Modal,
            State::Multiselectable,
            State::Offscreen,
            State::Pressed,
            State::Readonly,
            State::Required,
            State::Selected,
        ];
        ALL.iter().copied().find(|v| v.as_str() == s)
    }
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical element-level actions. `press_keys` is session-level and lives
/// in the dispatcher, not on nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Click,
    Collapse,
    Decrement,
    Dismiss,
    DoubleClick,
    Expand,
    Focus,
    Increment,
    LongPress,
    RightClick,
    Scroll,
    Select,
    SetValue,
    Toggle,
    Type,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Click => "click",
            Action::Collapse => "collapse",
            Action::Decrement => "decrement",
            Action::Dismiss => "dismiss",
            Action::DoubleClick => "doubleclick",
            Action::Expand => "expand",
            Action::Focus => "focus",
            Action::Increment => "increment",
            Action::LongPress => "longpress",
            Action::RightClick => "rightclick",
            Action::Scroll => "scroll",
            Action::Select => "select",
            Action::SetValue => "setvalue",
            Action::Toggle => "toggle",
            Action::Type => "type",
        }
    }

    pub fn parse(s: &str) -> Option<Action> {
        const ALL: [Action; 15] = [
            Action::Click,
            Action::Collapse,
            Action::Decrement,
            Action::Dismiss,
            Action::DoubleClick,
            Action::Expand,
            Action::Focus,
            Action::Increment,
            Action::LongPress,
            Action::RightClick,
            Action::Scroll,
            Action::Select,
            Action::SetValue,
            Action::Toggle,
            Action::Type,
        ];
        ALL.iter().copied().find(|v| v.as_str() == s)
    }

    /// Any action other than `focus` counts as meaningful for pruning and
    /// search scoring.
    pub fn is_meaningful(&self) -> bool {
        !matches!(self, Action::Focus)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform tag carried on the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Windows,
    Macos,
    Linux,
    Web,
    Android,
    Ios,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Macos => "macos",
            Platform::Linux => "linux",
            Platform::Web => "web",
            Platform::Android => "android",
            Platform::Ios => "ios",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How aggressively the transformer prunes the mapped tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    /// Interactable elements only.
    Minimal,
    /// Skip, hoist, clip and collapse (the default).
    #[default]
    Standard,
    /// Deep copy, no pruning.
    Full,
}

/// Which windows a snapshot covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Window list only, no tree walking.
    Overview,
    /// The active window (the default).
    #[default]
    Foreground,
    /// The desktop surface.
    Desktop,
    /// All windows.
    Full,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Overview => "overview",
            Scope::Foreground => "foreground",
            Scope::Desktop => "desktop",
            Scope::Full => "full",
        }
    }
}
