//! # Help Text
//!
//! Command documentation shown to users via the `help` command
//! (and whenever an unknown command arrives).

pub const MAIN: &str = concat!(
    "**📣 Ping Bot Help**\n",
    "Send commands as a direct message. Group names use A-Z, 0-9 and `-`;\n",
    "combine several groups with `+` (e.g. `join DAD+USA-CVILLE`).\n",
    "\n",
    "**Membership**\n",
    "* join [group]: Add yourself to a group\n",
    "* leave [group]: Remove yourself from a group\n",
    "* unsubscribe [groups]: Leave the listed groups, or every group\n",
    "* list: List all groups\n",
    "\n",
    "**Moderators**\n",
    "* creategroup [group]: Create a group (you become its first member)\n",
    "* deletegroup [group]: Delete a group\n",
    "* protectgroup / unprotectgroup [group]: Restrict joining to moderators\n",
    "* makepublicgroup / makeprivategroup [group]: Let anyone ping the group\n",
    "\n",
    "**Pinging**\n",
    "Write `!ping GROUP` in the community room to notify every member\n",
    "of GROUP (up to 3 groups per message).\n",
);
